//! Slope of a density and bisection search for its zero
//!
//! The mode of a smooth unimodal density is the zero of its derivative. The
//! slope estimators here implement [argmin::core::CostFunction] so they can be
//! handed to any of the `argmin` scalar root finders as well as to [bisect].
//!
use argmin::core::{CostFunction, Error};
use tracing::{debug, instrument};

use crate::density::Density;
use crate::SpectrumError;

///
/// Forward difference estimate of the derivative of a density
///
/// $$ f'(x) \approx \frac{f(x + h) - f(x)}{h} $$
///
/// The step is `h = √ε · max(|x|, 1)`, rounded so that `x + h` is exactly
/// representable. Much smaller steps lose all significant digits of the
/// numerator to cancellation.
///
#[derive(Debug, Clone, Copy)]
pub struct ForwardDifference<D> {
    density: D,
}

impl<D: Density> ForwardDifference<D> {
    pub fn new(density: D) -> Self {
        Self { density }
    }

    /// Step used at `x`
    pub fn step(x: f64) -> f64 {
        let h = f64::EPSILON.sqrt() * x.abs().max(1.0);
        (x + h) - x
    }

    pub fn slope(&self, x: f64) -> f64 {
        let h = Self::step(x);
        (self.density.density(x + h) - self.density.density(x)) / h
    }
}

///
/// Closed form derivative of a density
///
/// Falls back to [ForwardDifference] where the density does not provide
/// [Density::derivative].
///
#[derive(Debug, Clone, Copy)]
pub struct AnalyticSlope<D> {
    density: D,
}

impl<D: Density> AnalyticSlope<D> {
    pub fn new(density: D) -> Self {
        Self { density }
    }

    pub fn slope(&self, x: f64) -> f64 {
        match self.density.derivative(x) {
            Some(v) => v,
            None => {
                let h = ForwardDifference::<D>::step(x);
                (self.density.density(x + h) - self.density.density(x)) / h
            }
        }
    }
}

impl<D: Density> CostFunction for ForwardDifference<D> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.slope(*x))
    }
}

impl<D: Density> CostFunction for AnalyticSlope<D> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.slope(*x))
    }
}

///
/// Closed interval `[lo, hi]` with `lo <= hi`
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    lo: f64,
    hi: f64,
}

impl Bracket {
    /// Create a bracket, swapping the ends if necessary
    ///
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// Estimate of the root: the middle of the bracket
    pub fn midpoint(&self) -> f64 {
        self.lo + (self.hi - self.lo) / 2.0
    }

    pub fn contains(&self, x: f64) -> bool {
        (self.lo..=self.hi).contains(&x)
    }
}

///
/// Narrow down a sign change of `g` inside `[lo, hi]` by bisection
///
/// Repeatedly halves the bracket keeping the half with a sign change until its
/// width is at most `tolerance`. If `g` is exactly zero at an end or at one of
/// the midpoints a degenerate bracket at that point is returned.
///
/// # Errors
/// - [SpectrumError::NoBracket] if `g(lo)` and `g(hi)` do not have opposite
///   signs (including the case when either is NaN)
/// - [SpectrumError::BisectionStalled] if the tolerance is not met after
///   `max_steps` halvings
///
/// ```
/// # use watt_sampler::roots::bisect;
/// let bracket = bisect(|x| x - 3.0, 0.0, 8.0, 1e-5, 100).unwrap();
/// assert!(bracket.contains(3.0));
/// ```
///
#[instrument(level = "debug", skip(g))]
pub fn bisect(
    g: impl Fn(f64) -> f64,
    lo: f64,
    hi: f64,
    tolerance: f64,
    max_steps: usize,
) -> Result<Bracket, SpectrumError> {
    let Bracket { mut lo, mut hi } = Bracket::new(lo, hi);
    let mut g_lo = g(lo);
    let g_hi = g(hi);

    if g_lo == 0.0 {
        return Ok(Bracket::new(lo, lo));
    } else if g_hi == 0.0 {
        return Ok(Bracket::new(hi, hi));
    } else if !(g_lo.signum() * g_hi.signum() < 0.0) {
        return Err(SpectrumError::NoBracket { lo, hi, g_lo, g_hi });
    }

    for step in 0..max_steps {
        if hi - lo <= tolerance {
            debug!(step, lo, hi, "Bisection converged");
            return Ok(Bracket::new(lo, hi));
        }
        let mid = lo + (hi - lo) / 2.0;
        let g_mid = g(mid);

        if g_mid == 0.0 {
            return Ok(Bracket::new(mid, mid));
        } else if g_mid.signum() == g_lo.signum() {
            lo = mid;
            g_lo = g_mid;
        } else {
            hi = mid;
        }
    }

    if hi - lo <= tolerance {
        Ok(Bracket::new(lo, hi))
    } else {
        Err(SpectrumError::BisectionStalled {
            tolerance,
            steps: max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::WattSpectrum;
    use argmin::core::{Executor, State};
    use argmin::solver::brent::BrentRoot;

    /// Location of the mode of the Watt spectrum: tanh(s) = 1/s, E = s²/2
    const WATT_MODE: f64 = 0.7196144199;

    #[test]
    fn test_linear_root() {
        let bracket = bisect(|x| x - 3.0, 0.0, 8.0, 1e-5, 100).unwrap();

        assert!(bracket.contains(3.0), "{bracket:?} does not contain the root");
        assert!(bracket.width() <= 1e-5);
    }

    #[test]
    fn test_reversed_ends() {
        let bracket = bisect(|x| 1.0 - x, 4.0, -2.0, 1e-8, 100).unwrap();
        assert!(bracket.contains(1.0));
        approx::assert_abs_diff_eq!(1.0, bracket.midpoint(), epsilon = 1e-8);
    }

    #[test]
    fn test_exact_zero_at_end_or_midpoint() {
        assert_eq!(Bracket::new(0.0, 0.0), bisect(|x| x, 0.0, 1.0, 1e-9, 10).unwrap());
        assert_eq!(Bracket::new(1.0, 1.0), bisect(|x| x - 1.0, 0.0, 1.0, 1e-9, 10).unwrap());
        assert_eq!(Bracket::new(2.0, 2.0), bisect(|x| x - 2.0, 0.0, 4.0, 1e-9, 10).unwrap());
    }

    #[test]
    fn test_no_bracket() {
        let res = bisect(|x| x * x + 1.0, -1.0, 1.0, 1e-5, 100);
        assert!(
            matches!(res, Err(SpectrumError::NoBracket { .. })),
            "Failed to detect missing sign change"
        );
        assert!(bisect(|_| f64::NAN, 0.0, 1.0, 1e-5, 100).is_err());
    }

    #[test]
    fn test_stalled() {
        let res = bisect(|x| x - 0.3, 0.0, 1.0, 1e-12, 5);
        assert!(matches!(res, Err(SpectrumError::BisectionStalled { .. })));
    }

    #[test]
    fn test_step_is_representable() {
        for x in [0.0, 0.3, 1.0, 7.9, 1e6] {
            let h = ForwardDifference::<WattSpectrum>::step(x);
            assert!(h > 0.0);
            assert_eq!(h, (x + h) - x);
        }
    }

    #[test]
    fn test_slopes_agree() {
        let fd = ForwardDifference::new(WattSpectrum::default());
        let exact = AnalyticSlope::new(WattSpectrum::default());

        for e in [0.2, 0.5, 1.0, 2.0, 5.0] {
            approx::assert_abs_diff_eq!(exact.slope(e), fd.slope(e), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_watt_mode() {
        let fd = ForwardDifference::new(WattSpectrum::default());
        let exact = AnalyticSlope::new(WattSpectrum::default());

        let b_fd = bisect(|e| fd.slope(e), 0.0, 8.0, 1e-5, 200).unwrap();
        let b_exact = bisect(|e| exact.slope(e), 0.0, 8.0, 1e-5, 200).unwrap();

        approx::assert_abs_diff_eq!(WATT_MODE, b_fd.midpoint(), epsilon = 2e-5);
        approx::assert_abs_diff_eq!(WATT_MODE, b_exact.midpoint(), epsilon = 1e-5);
    }

    #[test]
    fn test_mode_matches_brent() {
        let slope = AnalyticSlope::new(WattSpectrum::default());
        let bisected = bisect(|e| slope.slope(e), 0.0, 8.0, 1e-8, 200).unwrap();

        let solver = BrentRoot::new(0.1, 8.0, 1e-11);
        let res = Executor::new(slope, solver)
            .configure(|state| state.param(1.0).max_iters(100))
            .run()
            .unwrap();
        let brent = *res.state().get_param().unwrap();

        approx::assert_abs_diff_eq!(brent, bisected.midpoint(), epsilon = 1e-7);
    }
}
