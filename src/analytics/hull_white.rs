// src/analytics/hull_white.rs
//! Hull-White cap pricing and calibration
//!
//! # Mathematical Foundation
//!
//! Under the one-factor Hull-White model `dr = (θ(t) − a r) dt + σ dW`, a
//! caplet on `[T_i, T_{i+1}]` is a put on the zero-coupon bond maturing at
//! `T_{i+1}`, struck at `L/FV` with face value `FV = L(1 + K δ_i)`:
//! ```text
//! σ_P  = √( σ²/(2a³) · (1 − e^(−2aT_i)) · (1 − e^(−aδ_i))² )
//! d₁   = ln(FV·P_{i+1} / (L·P_i)) / σ_P + σ_P/2,   d₂ = d₁ − σ_P
//! Cpl_i = L·P_i·Φ(−d₂) − FV·P_{i+1}·Φ(−d₁)
//! ```
//!
//! # Calibration
//!
//! `(a, σ)` minimise the sum of squared relative errors against market
//! caplet prices with a bounded Nelder-Mead simplex search.

use crate::error::{validation::*, LfmError, LfmResult};
use crate::math_utils::norm_cdf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullWhiteParams {
    /// Mean-reversion speed
    pub a: f64,
    pub sigma: f64,
}

impl HullWhiteParams {
    fn from_slice(x: &[f64]) -> Self {
        HullWhiteParams { a: x[0], sigma: x[1] }
    }
}

/// Cap schedule and curve used to price caplets under Hull-White.
#[derive(Debug, Clone, PartialEq)]
pub struct HullWhiteCapModel {
    expiries: Vec<f64>,
    discounts: Vec<f64>,
    cap_rate: f64,
    notional: f64,
}

impl HullWhiteCapModel {
    pub fn new(
        expiries: Vec<f64>,
        discounts: Vec<f64>,
        cap_rate: f64,
        notional: f64,
    ) -> LfmResult<Self> {
        validate_len("discount factors", expiries.len(), discounts.len())?;
        if expiries.len() < 2 {
            return Err(LfmError::DimensionMismatch {
                what: "cap schedule (at least two dates)".to_string(),
                expected: 2,
                actual: expiries.len(),
            });
        }
        for &p in &discounts {
            validate_positive("discount factor", p)?;
        }
        for pair in expiries.windows(2) {
            validate_positive("accrual period", pair[1] - pair[0])?;
        }
        validate_non_negative("cap rate", cap_rate)?;
        validate_positive("notional", notional)?;

        Ok(Self {
            expiries,
            discounts,
            cap_rate,
            notional,
        })
    }

    /// Discount factors `P_i = exp(−T_i r_i)` from continuously compounded zero rates
    pub fn from_zero_rates(
        expiries: Vec<f64>,
        zero_rates: &[f64],
        cap_rate: f64,
        notional: f64,
    ) -> LfmResult<Self> {
        validate_len("zero rates", expiries.len(), zero_rates.len())?;
        let discounts = expiries
            .iter()
            .zip(zero_rates)
            .map(|(t, r)| (-t * r).exp())
            .collect();
        Self::new(expiries, discounts, cap_rate, notional)
    }

    pub fn expiries(&self) -> &[f64] {
        &self.expiries
    }

    pub fn discounts(&self) -> &[f64] {
        &self.discounts
    }

    pub fn cap_rate(&self) -> f64 {
        self.cap_rate
    }

    pub fn notional(&self) -> f64 {
        self.notional
    }

    pub fn caplet_count(&self) -> usize {
        self.expiries.len() - 1
    }

    pub fn caplet_prices(&self, params: HullWhiteParams) -> LfmResult<Vec<f64>> {
        validate_positive("a", params.a)?;
        validate_positive("sigma", params.sigma)?;

        let (a, sigma) = (params.a, params.sigma);
        let l = self.notional;
        let p = &self.discounts;

        Ok((0..self.caplet_count())
            .map(|i| {
                let t = self.expiries[i];
                let accrual = self.expiries[i + 1] - t;
                let face_value = l * (1.0 + self.cap_rate * accrual);

                let sigma_p = (sigma * sigma / (2.0 * a * a * a)
                    * (1.0 - (-2.0 * a * t).exp())
                    * (1.0 - (-a * accrual).exp()).powi(2))
                .sqrt();
                let intrinsic = (l * p[i] - face_value * p[i + 1]).max(0.0);
                if sigma_p <= 0.0 {
                    return intrinsic;
                }

                let d1 = (face_value * p[i + 1] / (l * p[i])).ln() / sigma_p + 0.5 * sigma_p;
                let d2 = d1 - sigma_p;
                l * p[i] * norm_cdf(-d2) - face_value * p[i + 1] * norm_cdf(-d1)
            })
            .collect())
    }

    /// Sum of squared relative pricing errors
    pub fn calibration_error(&self, params: HullWhiteParams, market: &[f64]) -> LfmResult<f64> {
        validate_len("market caplet prices", self.caplet_count(), market.len())?;
        let model = self.caplet_prices(params)?;
        Ok(model
            .iter()
            .zip(market)
            .map(|(m, q)| ((m - q) / q).powi(2))
            .sum())
    }

    /// Fit `(a, σ)` to market caplet prices, starting from `initial`.
    pub fn calibrate_to_caps(
        &self,
        market: &[f64],
        initial: HullWhiteParams,
        bounds: &Bounds,
        options: NelderMeadOptions,
    ) -> LfmResult<HullWhiteCalibration> {
        validate_len("market caplet prices", self.caplet_count(), market.len())?;
        for &q in market {
            validate_positive("market caplet price", q)?;
        }
        validate_len("calibration bounds", 2, bounds.dimension())?;
        if bounds.lower.iter().any(|&lo| lo <= 0.0) {
            return Err(LfmError::CalibrationError {
                reason: "lower bounds for a and sigma must be positive".to_string(),
                current_error: None,
            });
        }

        let start = [initial.a, initial.sigma];
        let initial_error = self
            .calibration_error(HullWhiteParams::from_slice(&bounds.clamp(&start)), market)?;

        let result = nelder_mead(&start, bounds, options, |x| {
            self.calibration_error(HullWhiteParams::from_slice(x), market)
                .unwrap_or(f64::INFINITY)
        })?;

        if !result.objective.is_finite() {
            return Err(LfmError::CalibrationError {
                reason: "objective is not finite at the best simplex vertex".to_string(),
                current_error: Some(result.objective),
            });
        }

        Ok(HullWhiteCalibration {
            params: HullWhiteParams::from_slice(&result.x),
            initial_error,
            objective: result.objective,
            iterations: result.iterations,
            converged: result.converged,
        })
    }
}

/// Outcome of a Hull-White cap calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullWhiteCalibration {
    pub params: HullWhiteParams,
    pub initial_error: f64,
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Box constraints for the simplex search.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> LfmResult<Self> {
        validate_len("upper bounds", lower.len(), upper.len())?;
        if lower.is_empty() {
            return Err(LfmError::CalibrationError {
                reason: "bounds must have at least one dimension".to_string(),
                current_error: None,
            });
        }
        for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(LfmError::CalibrationError {
                    reason: format!("invalid bound at index {}: [{}, {}]", i, lo, hi),
                    current_error: None,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Default search box for `(a, σ)`
    pub fn hull_white() -> Self {
        Bounds {
            lower: vec![1e-4, 1e-4],
            upper: vec![2.0, 1.0],
        }
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .enumerate()
            .map(|(i, v)| v.clamp(self.lower[i], self.upper[i]))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Initial simplex edge as a fraction of each bound's width
    pub initial_step: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    pub tolerance: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            initial_step: 0.05,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            tolerance: 1e-12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplexResult {
    pub x: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Bounded Nelder-Mead minimisation of `objective_fn` from `initial`.
///
/// Terminates when both the objective spread and the largest vertex
/// distance from the centroid fall below `options.tolerance`.
pub fn nelder_mead<F>(
    initial: &[f64],
    bounds: &Bounds,
    options: NelderMeadOptions,
    mut objective_fn: F,
) -> LfmResult<SimplexResult>
where
    F: FnMut(&[f64]) -> f64,
{
    let dim = bounds.dimension();
    validate_len("initial simplex vertex", dim, initial.len())?;

    let x0 = bounds.clamp(initial);
    let mut simplex = Vec::with_capacity(dim + 1);
    let mut values = Vec::with_capacity(dim + 1);
    values.push(objective_fn(&x0));
    simplex.push(x0.clone());

    for d in 0..dim {
        let mut x = x0.clone();
        let step = (bounds.upper[d] - bounds.lower[d]).abs() * options.initial_step.max(1e-4);
        x[d] = (x[d] + step).min(bounds.upper[d]);
        if (x[d] - x0[d]).abs() < 1e-14 {
            x[d] = (x[d] - step).max(bounds.lower[d]);
        }
        let x = bounds.clamp(&x);
        values.push(objective_fn(&x));
        simplex.push(x);
    }

    let mut iterations = 0;
    let mut converged = false;

    for iter in 0..options.max_iterations {
        iterations = iter + 1;

        let mut order: Vec<usize> = (0..simplex.len()).collect();
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let spread = (values[dim] - values[0]).abs();
        let centroid: Vec<f64> = (0..dim)
            .map(|d| simplex.iter().take(dim).map(|x| x[d]).sum::<f64>() / dim as f64)
            .collect();
        let max_vertex_dist = simplex
            .iter()
            .map(|x| {
                x.iter()
                    .zip(centroid.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0_f64, f64::max);

        if spread <= options.tolerance && max_vertex_dist <= options.tolerance {
            converged = true;
            break;
        }

        let along = |coef: f64, from: &[f64]| -> Vec<f64> {
            bounds.clamp(
                &(0..dim)
                    .map(|d| centroid[d] + coef * (from[d] - centroid[d]))
                    .collect::<Vec<f64>>(),
            )
        };

        let xr = along(-options.reflection, &simplex[dim]);
        let fr = objective_fn(&xr);

        if fr < values[0] {
            let xe = along(options.expansion, &xr);
            let fe = objective_fn(&xe);
            if fe < fr {
                simplex[dim] = xe;
                values[dim] = fe;
            } else {
                simplex[dim] = xr;
                values[dim] = fr;
            }
            continue;
        }

        if fr < values[dim - 1] {
            simplex[dim] = xr;
            values[dim] = fr;
            continue;
        }

        let xc = along(options.contraction, &simplex[dim]);
        let fc = objective_fn(&xc);
        if fc < values[dim] {
            simplex[dim] = xc;
            values[dim] = fc;
            continue;
        }

        for i in 1..=dim {
            let shrunk: Vec<f64> = (0..dim)
                .map(|d| simplex[0][d] + options.shrink * (simplex[i][d] - simplex[0][d]))
                .collect();
            simplex[i] = bounds.clamp(&shrunk);
            values[i] = objective_fn(&simplex[i]);
        }
    }

    let best = (0..simplex.len())
        .min_by(|&i, &j| values[i].total_cmp(&values[j]))
        .unwrap_or(0);

    Ok(SimplexResult {
        x: simplex[best].clone(),
        objective: values[best],
        iterations,
        converged,
    })
}
