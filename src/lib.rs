//! Characterise an approximate Watt fission spectrum
//!
//! The crate takes the unnormalised density
//!
//! $$ f(E) = C \sinh(\sqrt{2E}) e^{-E} $$
//!
//! and runs it through a short numerical pipeline:
//!  - integrate it with the composite Simpson's rule,
//!  - find its mode by bisection on the (finite difference) derivative,
//!  - draw a fixed size sample by acceptance-rejection under the height of the mode,
//!  - summarise the sorted sample as a fixed-width histogram.
//!
//! Every stage is usable on its own with any scalar function, but the
//! [pipeline::run] function wires them together the way the binary does:
//! ```
//! # use watt_sampler::{pipeline, SpectrumConfig, SpectrumError};
//! # use rand::SeedableRng;
//! # fn main() -> Result<(), SpectrumError> {
//! let config = SpectrumConfig {
//!     sample_count: 1000,
//!     bin_count: 10,
//!     ..Default::default()
//! };
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let report = pipeline::run(&config, &mut rng)?;
//! assert_eq!(report.histogram.total(), 1000);
//! # Ok(())}
//! ```
//!
use thiserror::Error;

pub mod config;
pub mod density;
pub mod gof;
pub mod histogram;
pub mod integrate;
pub mod pipeline;
pub mod roots;
pub mod sampler;

pub use config::{DerivativeMode, SpectrumConfig};
pub use density::{Density, WattSpectrum};
pub use histogram::{Bin, Histogram};
pub use roots::Bracket;
pub use sampler::{RejectionSampler, SampleSet};

///
/// Failures of the numerical stages
///
#[derive(Error, Debug)]
pub enum SpectrumError {
    /// Simpson's rule needs an even, non-zero number of subintervals
    #[error("Simpson's rule requires an even, non-zero number of subintervals, got {0}")]
    InvalidSubdivisionCount(usize),
    /// Function has the same sign at both ends of the bracket
    #[error("Function does not change sign in [{lo}, {hi}] (g(lo) = {g_lo}, g(hi) = {g_hi})")]
    NoBracket {
        lo: f64,
        hi: f64,
        g_lo: f64,
        g_hi: f64,
    },
    /// Bisection ran out of steps before the bracket became narrow enough
    #[error("Bisection did not reach width {tolerance} within {steps} steps")]
    BisectionStalled { tolerance: f64, steps: usize },
    /// Density evaluated outside of `[0, +inf)`
    #[error("Energy {0} is outside of the density domain")]
    DomainViolation(f64),
    /// Rejection loop used all of its candidate draws
    #[error("Accepted only {accepted} of {target} samples in {draws} candidate draws")]
    SamplingBudgetExceeded {
        accepted: usize,
        target: usize,
        draws: u64,
    },
    /// Histogram input was not sorted in ascending order
    #[error("Samples are not sorted in ascending order")]
    UnsortedSamples,
    /// Histogram input contains a value outside `[0, domain_max]`
    #[error("Sample {value} is outside of [0, {domain_max}]")]
    SampleOutOfRange { value: f64, domain_max: f64 },
    /// Inconsistent configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
