//! Acceptance-rejection sampling of a density on a bounded domain
//!
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::density::Density;
use crate::SpectrumError;

///
/// Samples accepted by the [RejectionSampler]
///
/// Values come out in the order they were accepted. Call [SampleSet::sort]
/// before building a [crate::Histogram] from them.
///
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    values: Vec<f64>,
    draws: u64,
    envelope_violations: u64,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Number of candidate points drawn to build the set
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Number of candidates at which the density was above the bounding height
    ///
    /// Non-zero value means the bounding height was too low and the sample is
    /// biased (e.g. the density is not unimodal on the domain).
    ///
    pub fn envelope_violations(&self) -> u64 {
        self.envelope_violations
    }

    pub fn acceptance_ratio(&self) -> f64 {
        if self.draws == 0 {
            0.0
        } else {
            self.values.len() as f64 / self.draws as f64
        }
    }

    /// Sort the samples in ascending order
    pub fn sort(&mut self) {
        self.values.sort_by(f64::total_cmp);
    }
}

///
/// Acceptance-rejection sampler with a flat envelope
///
/// Candidate points `(x, y)` are drawn uniformly from the rectangle
/// `[0, domain_max] × [0, height]` and `x` is accepted if `y <= f(x)`. The
/// accepted values follow the density `f` restricted to the domain, provided
/// that `height` is not below the maximum of `f` there.
///
/// A single candidate can also be drawn through the [Distribution]
/// implementation, which yields `None` for a rejected point.
///
#[derive(Debug, Clone)]
pub struct RejectionSampler<D> {
    density: D,
    height: f64,
    x_dist: Uniform<f64>,
    y_dist: Uniform<f64>,
}

impl<D: Density> RejectionSampler<D> {
    /// Create a sampler on `[0, domain_max]` with a bounding `height`
    ///
    pub fn new(density: D, domain_max: f64, height: f64) -> Result<Self, SpectrumError> {
        if !(domain_max.is_finite() && domain_max > 0.0) {
            return Err(SpectrumError::InvalidConfig(format!(
                "sampling domain [0, {domain_max}] is empty"
            )));
        } else if !(height.is_finite() && height > 0.0) {
            return Err(SpectrumError::InvalidConfig(format!(
                "bounding height must be +ve and finite, got {height}"
            )));
        }

        Ok(Self {
            density,
            height,
            x_dist: Uniform::new_inclusive(0.0, domain_max),
            y_dist: Uniform::new_inclusive(0.0, height),
        })
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Draw a candidate point and return it with the density at its abscissa
    fn candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64, f64) {
        let x = self.x_dist.sample(rng);
        let y = self.y_dist.sample(rng);
        (x, y, self.density.density(x))
    }

    /// Collect exactly `target` accepted samples
    ///
    /// # Errors
    /// [SpectrumError::SamplingBudgetExceeded] if more than `max_draws`
    /// candidates would be needed.
    ///
    #[instrument(level = "debug", skip(self, rng))]
    pub fn sample_set<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        target: usize,
        max_draws: u64,
    ) -> Result<SampleSet, SpectrumError> {
        let mut set = SampleSet {
            values: Vec::with_capacity(target),
            ..Default::default()
        };

        while set.values.len() < target {
            if set.draws == max_draws {
                return Err(SpectrumError::SamplingBudgetExceeded {
                    accepted: set.values.len(),
                    target,
                    draws: set.draws,
                });
            }
            set.draws += 1;

            let (x, y, fx) = self.candidate(rng);
            if fx > self.height {
                set.envelope_violations += 1;
            }
            if y <= fx {
                set.values.push(x);
            }
        }

        if set.envelope_violations > 0 {
            warn!(
                violations = set.envelope_violations,
                height = self.height,
                "Density exceeded the bounding height, sample is biased"
            );
        }
        info!(
            accepted = set.len(),
            draws = set.draws,
            ratio = set.acceptance_ratio(),
            "Rejection sampling finished"
        );
        Ok(set)
    }
}

impl<D: Density> Distribution<Option<f64>> for RejectionSampler<D> {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        let (x, y, fx) = self.candidate(rng);
        (y <= fx).then_some(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::WattSpectrum;
    use rand::SeedableRng;

    const WATT_HEIGHT: f64 = 0.357448;

    #[test]
    fn test_sample_size_and_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(87674);
        let sampler = RejectionSampler::new(WattSpectrum::default(), 8.0, WATT_HEIGHT).unwrap();

        let set = sampler.sample_set(&mut rng, 5000, 1_000_000).unwrap();

        assert_eq!(5000, set.len());
        assert!(set.values().iter().all(|x| (0.0..=8.0).contains(x)));
        assert!(set.draws() >= 5000);
        assert_eq!(0, set.envelope_violations());
    }

    #[test]
    fn test_acceptance_ratio() {
        // Expected ratio is ∫f / (8 * height)
        let mut rng = rand::rngs::StdRng::seed_from_u64(12);
        let sampler = RejectionSampler::new(WattSpectrum::default(), 8.0, WATT_HEIGHT).unwrap();

        let set = sampler.sample_set(&mut rng, 20000, 1_000_000).unwrap();

        approx::assert_abs_diff_eq!(0.9982 / (8.0 * WATT_HEIGHT), set.acceptance_ratio(), epsilon = 0.01);
    }

    #[test]
    fn test_budget_exceeded() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        // Density is non-zero only on a tiny sliver of the domain
        let spike = |x: f64| if x < 1e-6 { 1.0 } else { 0.0 };
        let sampler = RejectionSampler::new(spike, 8.0, 1.0).unwrap();

        match sampler.sample_set(&mut rng, 10, 1000) {
            Err(SpectrumError::SamplingBudgetExceeded { target, draws, .. }) => {
                assert_eq!(10, target);
                assert_eq!(1000, draws);
            }
            other => panic!("Expected budget failure, got {other:?}"),
        }
    }

    #[test]
    fn test_low_envelope_is_reported() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let sampler = RejectionSampler::new(WattSpectrum::default(), 8.0, 0.2).unwrap();

        let set = sampler.sample_set(&mut rng, 1000, 1_000_000).unwrap();
        assert!(set.envelope_violations() > 0);
    }

    #[test]
    fn test_invalid_setup() {
        let watt = WattSpectrum::default();
        assert!(RejectionSampler::new(watt, 0.0, 1.0).is_err());
        assert!(RejectionSampler::new(watt, 8.0, 0.0).is_err());
        assert!(RejectionSampler::new(watt, 8.0, f64::NAN).is_err());
        assert!(RejectionSampler::new(watt, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_single_candidates() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let sampler = RejectionSampler::new(|x: f64| x, 1.0, 1.0).unwrap();

        let candidates = (0..1000)
            .map(|_| rng.sample(&sampler))
            .collect::<Vec<Option<f64>>>();

        let accepted = candidates.iter().flatten().count();
        assert!(accepted > 400 && accepted < 600, "Accepted {accepted} of 1000");
    }

    #[test]
    fn test_sort() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let sampler = RejectionSampler::new(WattSpectrum::default(), 8.0, WATT_HEIGHT).unwrap();

        let mut set = sampler.sample_set(&mut rng, 100, 100_000).unwrap();
        set.sort();
        assert!(set.values().windows(2).all(|w| w[0] <= w[1]));
    }
}
