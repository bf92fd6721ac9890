//! Unnormalised densities on `[0, +inf)`
//!
use crate::SpectrumError;

///
/// Unnormalised probability density of a non-negative variable
///
/// The sampler, integrator and mode search only ever call [Density::density]
/// inside the declared domain, so implementations are free to return garbage
/// (NaN) outside of it.
///
pub trait Density {
    /// Value of the density at `x`
    fn density(&self, x: f64) -> f64;

    /// Closed form derivative, if one is known
    fn derivative(&self, _x: f64) -> Option<f64> {
        None
    }
}

impl<F> Density for F
where
    F: Fn(f64) -> f64,
{
    fn density(&self, x: f64) -> f64 {
        self(x)
    }
}

///
/// Approximation to the Watt fission spectrum
///
/// $$ f(E) = C \sinh(\sqrt{2E}) e^{-E} $$
///
/// with no normalisation applied. With the default `C = 0.4865` the integral
/// over `[0, +inf)` is close to `1`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WattSpectrum {
    coefficient: f64,
}

impl Default for WattSpectrum {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COEFFICIENT)
    }
}

impl WattSpectrum {
    pub const DEFAULT_COEFFICIENT: f64 = 0.4865;

    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Evaluate the density, rejecting energies outside of the domain
    ///
    pub fn try_density(&self, energy: f64) -> Result<f64, SpectrumError> {
        if energy.is_finite() && energy >= 0.0 {
            Ok(self.density(energy))
        } else {
            Err(SpectrumError::DomainViolation(energy))
        }
    }
}

impl Density for WattSpectrum {
    fn density(&self, energy: f64) -> f64 {
        self.coefficient * f64::sinh(f64::sqrt(2.0 * energy)) * f64::exp(-energy)
    }

    /// $$ f'(E) = C e^{-E} \left( \frac{\cosh\sqrt{2E}}{\sqrt{2E}} - \sinh\sqrt{2E} \right) $$
    ///
    /// Diverges to `+inf` at `E = 0`.
    fn derivative(&self, energy: f64) -> Option<f64> {
        let s = f64::sqrt(2.0 * energy);
        Some(self.coefficient * f64::exp(-energy) * (f64::cosh(s) / s - f64::sinh(s)))
    }
}
