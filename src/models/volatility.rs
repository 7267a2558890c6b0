//! Instantaneous Volatility and Accrual Structure
//!
//! # Mathematical Framework
//!
//! Forward-rate volatilities follow the hump-shaped parametric form
//! ```text
//! σ(τ) = (a·τ + d)·exp(−b·τ) + c
//! ```
//! sampled on the simulation grid `τᵢ = i·Δt`, `Δt = T/N`. The first grid
//! point belongs to the anchor rate, which does not evolve, so `v[0] = 0`.

use crate::error::{validation::*, LfmResult};
use crate::math_utils::simpson;
use serde::{Deserialize, Serialize};

/// Shape constants of the hump volatility function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumpParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for HumpParameters {
    fn default() -> Self {
        HumpParameters {
            a: 0.19085664,
            b: 0.97462314,
            c: 0.08089168,
            d: 0.0134498,
        }
    }
}

impl HumpParameters {
    pub fn validate(&self) -> LfmResult<()> {
        validate_finite("a", self.a)?;
        validate_non_negative("b", self.b)?;
        validate_finite("c", self.c)?;
        validate_finite("d", self.d)?;
        Ok(())
    }

    /// Volatility at time-to-maturity `tau`
    pub fn volatility(&self, tau: f64) -> f64 {
        (self.a * tau + self.d) * (-self.b * tau).exp() + self.c
    }

    /// Product of the volatilities of two rates expiring at `t` and `s`, seen from `u`
    ///
    /// ```text
    /// σ(t − u) · σ(s − u)
    /// ```
    pub fn instantaneous_covariance(&self, u: f64, t: f64, s: f64) -> f64 {
        self.volatility(t - u) * self.volatility(s - u)
    }

    /// Integrated covariance `∫₀^min(t,s) σ(t − u)σ(s − u) du` with Simpson's rule
    pub fn integrated_covariance(&self, t: f64, s: f64, segments: usize) -> LfmResult<f64> {
        validate_non_negative("t", t)?;
        validate_non_negative("s", s)?;
        let horizon = t.min(s);
        simpson(
            |u| self.instantaneous_covariance(u, t, s),
            0.0,
            horizon,
            segments,
        )
    }
}

/// How the per-step volatilities are generated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VolatilitySpec {
    /// Hump-shaped parametric curve
    Hump(HumpParameters),
    /// Same volatility at every step after the anchor
    Flat(f64),
}

impl Default for VolatilitySpec {
    fn default() -> Self {
        VolatilitySpec::Hump(HumpParameters::default())
    }
}

/// Per-step instantaneous volatilities; `v[0]` is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityCurve {
    values: Vec<f64>,
    dt: f64,
}

impl VolatilityCurve {
    pub fn new(spec: &VolatilitySpec, steps: usize, maturity: f64) -> LfmResult<Self> {
        validate_steps(steps)?;
        validate_positive("maturity", maturity)?;
        let dt = maturity / steps as f64;

        let values = match *spec {
            VolatilitySpec::Hump(params) => {
                params.validate()?;
                (0..steps)
                    .map(|i| if i == 0 { 0.0 } else { params.volatility(i as f64 * dt) })
                    .collect()
            }
            VolatilitySpec::Flat(sigma) => {
                validate_non_negative("sigma", sigma)?;
                (0..steps).map(|i| if i == 0 { 0.0 } else { sigma }).collect()
            }
        };

        Ok(Self { values, dt })
    }

    pub fn hump(params: HumpParameters, steps: usize, maturity: f64) -> LfmResult<Self> {
        Self::new(&VolatilitySpec::Hump(params), steps, maturity)
    }

    pub fn flat(sigma: f64, steps: usize, maturity: f64) -> LfmResult<Self> {
        Self::new(&VolatilitySpec::Flat(sigma), steps, maturity)
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl std::ops::Index<usize> for VolatilityCurve {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.values[i]
    }
}

/// Accrual factors, anchor period first.
#[derive(Debug, Clone, PartialEq)]
pub struct TenorSchedule {
    accruals: Vec<f64>,
}

impl TenorSchedule {
    /// `steps` accrual factors: zero for the anchor, `tenor` for every other period.
    pub fn constant(tenor: f64, steps: usize) -> LfmResult<Self> {
        validate_steps(steps)?;
        validate_positive("tenor", tenor)?;
        let accruals = (0..steps).map(|i| if i == 0 { 0.0 } else { tenor }).collect();
        Ok(Self { accruals })
    }

    pub fn len(&self) -> usize {
        self.accruals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accruals.is_empty()
    }

    pub fn accruals(&self) -> &[f64] {
        &self.accruals
    }
}

impl std::ops::Index<usize> for TenorSchedule {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.accruals[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_hump_curve_matches_closed_form() {
        let curve = VolatilityCurve::hump(HumpParameters::default(), 10, 1.0).unwrap();
        assert_eq!(curve.len(), 10);
        assert_eq!(curve[0], 0.0);
        assert_abs_diff_eq!(curve.dt(), 0.1, epsilon = 1e-15);

        // (0.19085664·0.1 + 0.0134498)·e^(−0.097462314) + 0.08089168
        assert_abs_diff_eq!(curve[1], 0.1104057878257138, epsilon = 1e-12);
        let expected_5 = (0.19085664 * 0.5 + 0.0134498) * (-0.97462314_f64 * 0.5).exp() + 0.08089168;
        assert_abs_diff_eq!(curve[5], expected_5, epsilon = 1e-15);
    }

    #[test]
    fn test_flat_curve() {
        let curve = VolatilityCurve::flat(0.2, 5, 2.0).unwrap();
        assert_eq!(curve.values(), &[0.0, 0.2, 0.2, 0.2, 0.2]);
        assert!(VolatilityCurve::flat(-0.1, 5, 2.0).is_err());
    }

    #[test]
    fn test_tenor_schedule() {
        let tenors = TenorSchedule::constant(0.5, 4).unwrap();
        assert_eq!(tenors.accruals(), &[0.0, 0.5, 0.5, 0.5]);
        assert!(TenorSchedule::constant(0.0, 4).is_err());
        assert!(TenorSchedule::constant(0.5, 0).is_err());
    }

    #[test]
    fn test_integrated_covariance_of_constant_volatility() {
        // a = b = d = 0 leaves σ ≡ c, so the integral is c²·min(t, s)
        let params = HumpParameters {
            a: 0.0,
            b: 0.0,
            c: 0.2,
            d: 0.0,
        };
        let value = params.integrated_covariance(1.5, 2.0, 100).unwrap();
        assert_abs_diff_eq!(value, 0.04 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_integrated_covariance_is_positive() {
        let params = HumpParameters::default();
        let short = params.integrated_covariance(0.5, 1.0, 100).unwrap();
        let long = params.integrated_covariance(1.0, 1.0, 100).unwrap();
        assert!(short > 0.0);
        assert!(long > short);
    }

    proptest! {
        #[test]
        fn prop_anchor_volatility_is_zero(steps in 1usize..200, maturity in 0.01f64..30.0) {
            let curve = VolatilityCurve::hump(HumpParameters::default(), steps, maturity).unwrap();
            prop_assert_eq!(curve[0], 0.0);
            prop_assert_eq!(curve.len(), steps);
            prop_assert!(curve.values().iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }
}
