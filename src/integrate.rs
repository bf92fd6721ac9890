//! Composite Simpson's rule
//!
use tracing::debug;

use crate::SpectrumError;

///
/// Integrate `f` over `[a, b]` with the composite Simpson's rule
///
/// Uses `n` subintervals of width `h = (b - a) / n`:
///
/// $$ \int_a^b f(x) dx \approx \frac{h}{3} \left[ f(a) + 4 \sum_{odd\ i} f(a + ih) + 2 \sum_{even\ i} f(a + ih) + f(b) \right] $$
///
/// The rule is exact for polynomials up to the third degree.
///
/// # Errors
/// [SpectrumError::InvalidSubdivisionCount] if `n` is odd or zero. The
/// function is not evaluated at all in that case.
///
/// ```
/// # use watt_sampler::integrate::simpson;
/// let v = simpson(0.0, 1.0, 2, |x| x * x * x).unwrap();
/// assert!((v - 0.25).abs() < 1e-12);
/// ```
///
pub fn simpson(a: f64, b: f64, n: usize, f: impl Fn(f64) -> f64) -> Result<f64, SpectrumError> {
    if n == 0 || n % 2 != 0 {
        return Err(SpectrumError::InvalidSubdivisionCount(n));
    }

    let h = (b - a) / n as f64;
    let mut total = f(a) + f(b);

    for i in 1..n {
        let weight = if i % 2 == 0 { 2.0 } else { 4.0 };
        total += weight * f(a + h * i as f64);
    }

    Ok(total * h / 3.0)
}

///
/// Integrate `f` over each of the consecutive intervals defined by `edges`
///
/// Every interval is integrated with [simpson] using `n` subintervals, so the
/// result has `edges.len() - 1` entries.
///
pub fn simpson_bins(
    edges: &[f64],
    n: usize,
    f: impl Fn(f64) -> f64,
) -> Result<Vec<f64>, SpectrumError> {
    let integrals = edges
        .windows(2)
        .map(|w| simpson(w[0], w[1], n, &f))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(bins = integrals.len(), "Integrated density over bins");
    Ok(integrals)
}
