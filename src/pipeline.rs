//! Full characterisation of the spectrum for a given configuration
//!
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::config::{DerivativeMode, SpectrumConfig};
use crate::density::{Density, WattSpectrum};
use crate::histogram::Histogram;
use crate::integrate::simpson;
use crate::roots::{bisect, AnalyticSlope, Bracket, ForwardDifference};
use crate::sampler::{RejectionSampler, SampleSet};
use crate::SpectrumError;

///
/// Everything a run of the pipeline produces
///
#[derive(Debug, Clone)]
pub struct SpectrumReport {
    /// Integral over the configured interval, `None` if it could not be computed
    pub integral: Option<f64>,
    /// Final bisection bracket around the mode
    pub bracket: Bracket,
    /// Estimated location of the mode
    pub mode: f64,
    /// Density at the mode, used as the bounding height of the sampler
    pub height: f64,
    /// Accepted samples sorted in ascending order
    pub samples: SampleSet,
    pub histogram: Histogram,
}

///
/// Locate the mode of `density` inside `config.mode_bracket`
///
/// The density is assumed to be unimodal over the sampling domain, so the only
/// zero of its slope is the global maximum.
///
pub fn find_mode<D: Density + Copy>(
    density: D,
    config: &SpectrumConfig,
) -> Result<Bracket, SpectrumError> {
    let (lo, hi) = config.mode_bracket;
    let (tol, steps) = (config.root_tolerance, config.max_bisections);

    match config.derivative {
        DerivativeMode::ForwardDifference => {
            let slope = ForwardDifference::new(density);
            bisect(|e| slope.slope(e), lo, hi, tol, steps)
        }
        DerivativeMode::Analytic => {
            let slope = AnalyticSlope::new(density);
            bisect(|e| slope.slope(e), lo, hi, tol, steps)
        }
    }
}

///
/// Integrate, find the mode, sample and bin the Watt spectrum
///
/// An odd subdivision count only drops the integral from the report; all the
/// other failures abort the run.
///
#[instrument(level = "debug", skip(config, rng))]
pub fn run<R: Rng + ?Sized>(
    config: &SpectrumConfig,
    rng: &mut R,
) -> Result<SpectrumReport, SpectrumError> {
    config.validate()?;
    let watt = WattSpectrum::new(config.coefficient);

    let (a, b) = config.integration_interval;
    let integral = match simpson(a, b, config.subdivisions, |e| watt.density(e)) {
        Ok(v) => {
            info!(a, b, n = config.subdivisions, integral = v, "Simpson's rule integral");
            Some(v)
        }
        Err(e) => {
            warn!("Skipping the integral: {e}");
            None
        }
    };

    let bracket = find_mode(watt, config)?;
    let mode = bracket.midpoint();
    let height = watt.density(mode);
    info!(lo = bracket.lo(), hi = bracket.hi(), "Bisection bracket");
    info!(mode, height, "Maximum of the density");

    let sampler = RejectionSampler::new(watt, config.domain_max, height)?;
    let mut samples = sampler.sample_set(rng, config.sample_count, config.max_draws)?;
    samples.sort();
    info!(size = samples.len(), "Sample collected");

    let histogram = Histogram::build(samples.values(), config.domain_max, config.bin_count)?;

    Ok(SpectrumReport {
        integral,
        bracket,
        mode,
        height,
        samples,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gof::{chi_square_test, expected_bin_probabilities};
    use rand::SeedableRng;

    fn small_config() -> SpectrumConfig {
        SpectrumConfig {
            sample_count: 20_000,
            bin_count: 40,
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_run() {
        let config = small_config();
        let mut rng = rand::rngs::StdRng::seed_from_u64(2024);

        let report = run(&config, &mut rng).unwrap();

        approx::assert_abs_diff_eq!(1.002273, report.integral.unwrap(), epsilon = 1e-5);
        assert!(report.bracket.width() <= 1e-5);
        approx::assert_abs_diff_eq!(0.719614, report.mode, epsilon = 2e-5);
        approx::assert_abs_diff_eq!(0.357448, report.height, epsilon = 1e-6);

        assert_eq!(20_000, report.samples.len());
        assert_eq!(40, report.histogram.bin_count());
        assert_eq!(20_000, report.histogram.total());
        assert!(report.samples.values().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_mode_is_global_maximum() {
        // Bisection only finds a critical point; check it is the top of the
        // density over the whole sampling domain
        let config = SpectrumConfig::default();
        let watt = WattSpectrum::new(config.coefficient);
        let height = watt.density(find_mode(watt, &config).unwrap().midpoint());

        let grid_max = (0..=80_000)
            .map(|i| watt.density(i as f64 * 1e-4))
            .fold(0.0, f64::max);
        assert!(height >= grid_max - 1e-9, "{height} < {grid_max}");
    }

    #[test]
    fn test_bimodal_density_is_flagged() {
        // Two bumps: the bracket only sees the smaller one, so the envelope is too low
        let bimodal = |x: f64| f64::exp(-(x - 1.0).powi(2) * 8.0) + 2.0 * f64::exp(-(x - 6.0).powi(2) * 8.0);
        let config = SpectrumConfig {
            mode_bracket: (0.0, 3.0),
            ..Default::default()
        };

        let bracket = find_mode(bimodal, &config).unwrap();
        let height = bimodal(bracket.midpoint());
        approx::assert_abs_diff_eq!(1.0, bracket.midpoint(), epsilon = 1e-4);

        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let sampler = RejectionSampler::new(bimodal, 8.0, height).unwrap();
        let set = sampler.sample_set(&mut rng, 2000, 1_000_000).unwrap();
        assert!(set.envelope_violations() > 0);
    }

    #[test]
    fn test_analytic_derivative_mode() {
        let config = SpectrumConfig {
            derivative: DerivativeMode::Analytic,
            ..small_config()
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(4);

        let report = run(&config, &mut rng).unwrap();
        approx::assert_abs_diff_eq!(0.719614, report.mode, epsilon = 1e-5);
    }

    #[test]
    fn test_odd_subdivisions_skip_integral() {
        let config = SpectrumConfig {
            subdivisions: 101,
            ..small_config()
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(8);

        let report = run(&config, &mut rng).unwrap();
        assert_eq!(None, report.integral);
        assert_eq!(20_000, report.histogram.total());
    }

    #[test]
    fn test_failures_abort_run() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(8);

        // Slope is negative at both ends of [2, 8]
        let config = SpectrumConfig {
            mode_bracket: (2.0, 8.0),
            ..small_config()
        };
        assert!(matches!(
            run(&config, &mut rng),
            Err(SpectrumError::NoBracket { .. })
        ));

        let config = SpectrumConfig {
            max_draws: 100,
            ..small_config()
        };
        assert!(matches!(
            run(&config, &mut rng),
            Err(SpectrumError::SamplingBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_histogram_shape() {
        let config = small_config();
        let mut rng = rand::rngs::StdRng::seed_from_u64(31337);

        let report = run(&config, &mut rng).unwrap();
        let expected = expected_bin_probabilities(WattSpectrum::default(), &report.histogram).unwrap();
        let res = chi_square_test(&report.histogram, &expected).unwrap();

        println!("{res:?}");
        assert!(res.p_value() > 1e-4);
    }
}
