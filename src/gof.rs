//! Goodness-of-fit tests for samples drawn from a known density
//!
//! Two tests are provided to check that the output of a sampler follows the
//! target shape:
//!  - Pearson's χ² test on a [Histogram] against expected bin probabilities
//!  - one-sample Kolmogorov-Smirnov test against a cumulative distribution
//!
//! Both return a [TestResult] whose p-value is compared against a threshold:
//! ```
//! # use watt_sampler::gof::*;
//! # use rand::prelude::*;
//! # fn main() -> Result<(), GofError> {
//! let mut rng = StdRng::seed_from_u64(7);
//! let samples: Vec<f64> = (0..500).map(|_| rng.gen()).collect();
//!
//! let result = ks1_test(|x| x.clamp(0.0, 1.0), samples)?;
//! assert!(result.p_value() > 0.01);
//! # Ok(())}
//! ```
//! Since the normalisation of the densities in this crate is arbitrary, the
//! expected bin probabilities and the tabulated cdf are renormalised over the
//! sampling domain.
//!
use std::f64::consts::PI;

use statrs::distribution::{ChiSquared, ContinuousCDF};
use thiserror::Error;

use crate::density::Density;
use crate::histogram::Histogram;
use crate::integrate::simpson_bins;
use crate::SpectrumError;

///
/// Error that can be raised by a goodness-of-fit test
///
#[derive(Debug, Error)]
pub enum GofError {
    /// Some of the samples cannot be ordered (e.g. NaN)
    #[error("Collection contains values that cannot be placed in an order sequence (e.g. NaN for floats)")]
    ContainsNotSortableValues,
    #[error("Cannot test an empty sample")]
    EmptySample,
    #[error("Got {expected} expected probabilities for {bins} bins")]
    LengthMismatch { expected: usize, bins: usize },
    /// Expected probabilities are negative, non-finite or all zero
    #[error("Expected probabilities do not form a distribution")]
    InvalidExpectation,
    /// Too few populated groups are left after merging sparse bins
    #[error("Need at least two groups of bins for the chi-square test, got {0}")]
    TooFewGroups(usize),
    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}

/// Represents a result of a goodness-of-fit test
///
/// Contains the value of the test statistic and its p-value.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    stat: f64,
    p: f64,
}

impl TestResult {
    /// Complement of the Kolmogorov distribution cdf `Q(z) = 1 - CDF(z)`
    ///
    /// Series follow "Numerical Recipes" by Press et al. (2007).
    ///
    fn complement_ks_cdf(z: f64) -> f64 {
        if z <= 0.0 {
            1.0
        } else if z < 1.18 {
            let factor = f64::sqrt(2.0 * PI) / z;
            let term = f64::exp(-PI * PI / 8. / (z * z));
            1.0 - factor * (term + term.powi(9) + term.powi(25) + term.powi(49))
        } else {
            let term = f64::exp(-2.0 * z * z);
            2.0 * (term - term.powi(4) + term.powi(9))
        }
    }

    fn new_ks(stat: f64, n: f64) -> Self {
        let sqrt_n = f64::sqrt(n);
        let arg = sqrt_n + 0.12 + 0.11 / sqrt_n;
        let p = Self::complement_ks_cdf(arg * stat);
        Self { stat, p }
    }

    fn new_chi_square(stat: f64, dof: usize) -> Result<Self, GofError> {
        let dist = ChiSquared::new(dof as f64).map_err(|_| GofError::TooFewGroups(dof + 1))?;
        Ok(Self {
            stat,
            p: 1.0 - dist.cdf(stat),
        })
    }

    /// Probability of a statistic at least this extreme under the null hypothesis
    ///
    pub fn p_value(&self) -> f64 {
        self.p
    }

    pub fn stat(&self) -> f64 {
        self.stat
    }
}

///
/// Minimum expected count of a group of bins in the chi-square test
///
pub const MIN_EXPECTED_COUNT: f64 = 5.0;

///
/// Pearson's chi-square test of a histogram against expected bin probabilities
///
/// `expected` holds one non-negative weight per bin; it is rescaled to the
/// total count of the histogram. Consecutive bins are merged until each group
/// expects at least [MIN_EXPECTED_COUNT] samples, with a sparse tail folded
/// into the last group.
///
pub fn chi_square_test(hist: &Histogram, expected: &[f64]) -> Result<TestResult, GofError> {
    if expected.len() != hist.bin_count() {
        return Err(GofError::LengthMismatch {
            expected: expected.len(),
            bins: hist.bin_count(),
        });
    }
    let total = hist.total();
    if total == 0 {
        return Err(GofError::EmptySample);
    }
    let weight: f64 = expected.iter().sum();
    if expected.iter().any(|p| !(p.is_finite() && *p >= 0.0)) || !(weight > 0.0) {
        return Err(GofError::InvalidExpectation);
    }
    let scale = total as f64 / weight;

    // Groups of (observed, expected)
    let mut groups: Vec<(f64, f64)> = Vec::new();
    let mut current = (0.0, 0.0);
    for (bin, p) in std::iter::zip(hist.bins(), expected) {
        current.0 += bin.count as f64;
        current.1 += p * scale;
        if current.1 >= MIN_EXPECTED_COUNT {
            groups.push(current);
            current = (0.0, 0.0);
        }
    }
    match groups.last_mut() {
        Some(last) => {
            last.0 += current.0;
            last.1 += current.1;
        }
        None => groups.push(current),
    }

    if groups.len() < 2 {
        return Err(GofError::TooFewGroups(groups.len()));
    }

    let stat: f64 = groups
        .iter()
        .map(|(obs, exp)| (obs - exp).powi(2) / exp)
        .sum();

    TestResult::new_chi_square(stat, groups.len() - 1)
}

///
/// One-sample Kolmogorov-Smirnov test
///
/// Evaluates
///
/// $$ KS = \max |F_n(x) - F(x)| $$
///
/// where $F_n$ is the empirical cdf of the samples and $F$ the reference
/// cdf. The p-value follows (Press 2007).
///
/// # References
/// - Press W. H. , Teukolsky S. A., Vetterling W. T., Flannery B. P. (2007).
///   Numerical Recipes 3rd Edition: The Art of Scientific Computing (3rd. ed.).
///   Cambridge University Press, USA.
///
pub fn ks1_test(cdf: impl Fn(f64) -> f64, mut samples: Vec<f64>) -> Result<TestResult, GofError> {
    if samples.is_empty() {
        return Err(GofError::EmptySample);
    } else if samples.iter().any(|x| x.is_nan()) {
        return Err(GofError::ContainsNotSortableValues);
    }
    samples.sort_by(f64::total_cmp);

    let n = samples.len() as f64;
    let stat = samples
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let f = cdf(*x);
            f64::max((i + 1) as f64 / n - f, f - i as f64 / n)
        })
        .fold(0.0, f64::max);

    Ok(TestResult::new_ks(stat, n))
}

///
/// Normalised cumulative distribution of a density on `[0, domain_max]`
///
/// Tabulated on a uniform grid with Simpson's rule on every cell and linearly
/// interpolated in between.
///
#[derive(Debug, Clone)]
pub struct TabulatedCdf {
    x: Vec<f64>,
    cdf: Vec<f64>,
}

impl TabulatedCdf {
    /// Tabulate the cdf of `density` on `cells` cells
    ///
    pub fn new(density: impl Density, domain_max: f64, cells: usize) -> Result<Self, GofError> {
        if cells == 0 || !(domain_max > 0.0) {
            return Err(GofError::InvalidExpectation);
        }
        let dx = domain_max / cells as f64;
        let x = (0..=cells).map(|i| i as f64 * dx).collect::<Vec<_>>();
        let parts = simpson_bins(&x, 4, |e| density.density(e))?;

        let mut cdf = Vec::with_capacity(x.len());
        cdf.push(0.0);
        for p in parts {
            // Never empty
            let top = cdf[cdf.len() - 1];
            cdf.push(top + p);
        }
        let total = cdf[cdf.len() - 1];
        if !(total.is_finite() && total > 0.0) {
            return Err(GofError::InvalidExpectation);
        }
        cdf.iter_mut().for_each(|c| *c /= total);

        Ok(Self { x, cdf })
    }

    /// Value of the cdf at `val`, clamped to `[0, 1]` outside of the grid
    ///
    pub fn get(&self, val: f64) -> f64 {
        let idx = self.x.partition_point(|x| *x <= val);
        if idx == 0 {
            0.0
        } else if idx == self.x.len() {
            1.0
        } else {
            let (x0, x1) = (self.x[idx - 1], self.x[idx]);
            let (c0, c1) = (self.cdf[idx - 1], self.cdf[idx]);
            (val - x0) / (x1 - x0) * (c1 - c0) + c0
        }
    }
}

///
/// Expected probability of every bin of `hist` under `density`
///
pub fn expected_bin_probabilities(
    density: impl Density,
    hist: &Histogram,
) -> Result<Vec<f64>, GofError> {
    let parts = simpson_bins(&hist.edges(), 16, |e| density.density(e))?;
    let total: f64 = parts.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(GofError::InvalidExpectation);
    }
    Ok(parts.into_iter().map(|p| p / total).collect())
}
