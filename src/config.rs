//! Named configuration of the spectrum pipeline
//!
use std::path::PathBuf;

use crate::SpectrumError;

///
/// How the slope of the density is obtained when searching for its mode
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivativeMode {
    /// Forward difference with a step scaled to the floating point precision
    #[default]
    ForwardDifference,
    /// Closed form derivative provided by the density
    Analytic,
}

///
/// All the constants that drive a single run of the pipeline
///
/// The [Default] values reproduce the reference run: 100 000 samples of the
/// spectrum on `[0, 8]` binned into 100 bins of width `0.08`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumConfig {
    /// Multiplicative constant `C` of the density
    pub coefficient: f64,
    /// Upper end of the sampling domain `[0, domain_max]`
    pub domain_max: f64,
    /// Interval over which the density integral is reported
    pub integration_interval: (f64, f64),
    /// Number of Simpson subintervals (must be even)
    pub subdivisions: usize,
    /// Initial bracket for the search of the mode
    pub mode_bracket: (f64, f64),
    /// Target width of the final bisection bracket
    pub root_tolerance: f64,
    /// Maximum number of bisection steps
    pub max_bisections: usize,
    /// Number of accepted samples to collect
    pub sample_count: usize,
    /// Number of histogram bins over `[0, domain_max]`
    pub bin_count: usize,
    /// Maximum number of candidate draws of the rejection loop
    pub max_draws: u64,
    pub derivative: DerivativeMode,
    /// File the bin table is written to
    pub output_path: PathBuf,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            coefficient: 0.4865,
            domain_max: 8.0,
            integration_interval: (0.0, 10.0),
            subdivisions: 100,
            mode_bracket: (0.0, 8.0),
            root_tolerance: 1e-5,
            max_bisections: 200,
            sample_count: 100_000,
            bin_count: 100,
            max_draws: 100_000_000,
            derivative: DerivativeMode::ForwardDifference,
            output_path: PathBuf::from("BinData.txt"),
        }
    }
}

impl SpectrumConfig {
    /// Check the values that would otherwise make a stage fail half-way
    ///
    /// The parity of `subdivisions` is deliberately not checked here: an odd
    /// count only disables the integral report.
    ///
    pub fn validate(&self) -> Result<(), SpectrumError> {
        let invalid = |msg: String| Err(SpectrumError::InvalidConfig(msg));

        if !(self.coefficient.is_finite() && self.coefficient > 0.0) {
            return invalid(format!("coefficient must be +ve, got {}", self.coefficient));
        }
        if !(self.domain_max.is_finite() && self.domain_max > 0.0) {
            return invalid(format!("domain_max must be +ve, got {}", self.domain_max));
        }
        let (lo, hi) = self.mode_bracket;
        if !(0.0 <= lo && lo < hi && hi.is_finite()) {
            return invalid(format!("mode bracket [{lo}, {hi}] is empty or negative"));
        }
        if !(self.root_tolerance > 0.0) {
            return invalid(format!(
                "root tolerance must be +ve, got {}",
                self.root_tolerance
            ));
        }
        if self.sample_count == 0 {
            return invalid("sample_count must be non-zero".into());
        }
        if self.bin_count == 0 {
            return invalid("bin_count must be non-zero".into());
        }
        if self.max_draws == 0 {
            return invalid("max_draws must be non-zero".into());
        }
        Ok(())
    }
}
