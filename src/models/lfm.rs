//! LIBOR Market Model Forward-Rate Paths
//!
//! # Mathematical Framework
//!
//! Under the measure of numeraire index n, each forward rate is lognormal:
//! ```text
//! dF_k / F_k = μ_k dt + v_k dZ_k
//! ```
//! with the drift split around the numeraire:
//! ```text
//! k < n:  μ_k = −Σ_{j=k+1}^{n−1} ρ_kj τ_j v_k F_{j−1} / (1 + τ_j F_{j−1})
//! k ≥ n:  μ_k = +Σ_{j=n}^{k−1}   ρ_kj τ_j v_k F_{j−1} / (1 + τ_j F_{j−1})
//! ```
//!
//! # Log-Euler Discretization
//!
//! ```text
//! ln F_k(l+1) = ln F_{k−1} + v_k·μ_k·Δt − ½ v_k² Δt + v_k Z_k √Δt
//! ```
//!
//! The two drift sums start at zero once per step and keep accumulating
//! over the rate loop, so rate k also carries the terms added for the rates
//! before it in the same step.
//!
//! Rate 0 is the anchor and stays at the initial rate. Rates are written in
//! index order into a copy of the previous row, so `F_{j−1}` refers to the
//! current step for `j − 1 < k` and to the previous step otherwise. Rate k is
//! grown from the level of rate k−1, not from its own previous value.

use crate::error::{validation::*, LfmError, LfmResult};
use crate::models::correlation::{CorrelationDecomposer, CorrelationMatrix};
use crate::models::volatility::{TenorSchedule, VolatilityCurve};
use crate::rng::DeviateSource;
use ndarray::{Array1, Array2, ArrayView1};

/// One simulated path: row 0 holds the initial rates, row l+1 the rates after step l.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRatePath {
    rates: Array2<f64>,
}

impl ForwardRatePath {
    pub fn steps(&self) -> usize {
        self.rates.nrows() - 1
    }

    pub fn rate_count(&self) -> usize {
        self.rates.ncols()
    }

    pub fn row(&self, l: usize) -> ArrayView1<'_, f64> {
        self.rates.row(l)
    }

    /// Rows produced by the simulation steps, initial row excluded.
    pub fn step_rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> + '_ {
        self.rates.outer_iter().skip(1)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.rates
    }
}

/// A rate that left the log domain within one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDivergence {
    pub rate: usize,
    pub value: f64,
}

impl RateDivergence {
    pub fn at(self, path: usize, step: usize) -> LfmError {
        LfmError::NumericalDivergence {
            path,
            step,
            rate: self.rate,
            value: self.value,
        }
    }
}

/// Evolves the forward-rate vector step by step for one path at a time.
///
/// All state is read-only after construction, so one simulator is shared by
/// every worker.
#[derive(Debug, Clone)]
pub struct ForwardRatePathSimulator {
    correlation: CorrelationMatrix,
    decomposer: CorrelationDecomposer,
    volatility: VolatilityCurve,
    tenors: TenorSchedule,
    initial_rate: f64,
    numeraire: usize,
}

impl ForwardRatePathSimulator {
    pub fn new(
        correlation: CorrelationMatrix,
        decomposer: CorrelationDecomposer,
        volatility: VolatilityCurve,
        tenors: TenorSchedule,
        initial_rate: f64,
        numeraire: usize,
    ) -> LfmResult<Self> {
        let m = correlation.dim();
        validate_len("correlation decomposition", m, decomposer.dim())?;
        // Volatilities and accruals are looked up by rate index.
        if volatility.len() < m {
            return Err(LfmError::DimensionMismatch {
                what: "volatility curve (one entry per rate at least)".to_string(),
                expected: m,
                actual: volatility.len(),
            });
        }
        if tenors.len() < m {
            return Err(LfmError::DimensionMismatch {
                what: "tenor schedule (one entry per rate at least)".to_string(),
                expected: m,
                actual: tenors.len(),
            });
        }
        validate_len("tenor schedule", volatility.len(), tenors.len())?;
        validate_positive("initial_rate", initial_rate)?;
        validate_finite("initial_rate", initial_rate)?;
        validate_numeraire(numeraire, m)?;

        Ok(Self {
            correlation,
            decomposer,
            volatility,
            tenors,
            initial_rate,
            numeraire,
        })
    }

    pub fn rate_count(&self) -> usize {
        self.correlation.dim()
    }

    pub fn steps(&self) -> usize {
        self.volatility.len()
    }

    pub fn tenors(&self) -> &TenorSchedule {
        &self.tenors
    }

    pub fn initial_row(&self) -> Array1<f64> {
        Array1::from_elem(self.rate_count(), self.initial_rate)
    }

    /// Advance one time step from `prev`, using the correlated deviates `z`.
    pub fn step(&self, prev: ArrayView1<'_, f64>, z: &[f64]) -> Result<Array1<f64>, RateDivergence> {
        let m = self.rate_count();
        let dt = self.volatility.dt();
        let sqrt_dt = dt.sqrt();
        let n = self.numeraire;

        let mut next = prev.to_owned();
        next[0] = self.initial_rate;

        // both sums run across the whole rate loop of this step
        let mut mu = 0.0;
        let mut mu1 = 0.0;
        for k in 1..m {
            let vk = self.volatility[k];

            if k < n {
                for j in (k + 1)..n {
                    mu += self.drift_term(k, j, next[j - 1], vk, dt)?;
                }
            } else {
                for j in n..k {
                    mu1 += self.drift_term(k, j, next[j - 1], vk, dt)?;
                }
            }
            let drift = -mu + mu1;

            let log_f = next[k - 1].ln() + vk * drift - 0.5 * vk * vk * dt + vk * z[k] * sqrt_dt;
            let rate = log_f.exp();
            if !log_f.is_finite() || !rate.is_finite() || rate <= 0.0 {
                return Err(RateDivergence { rate: k, value: rate });
            }
            next[k] = rate;
        }

        Ok(next)
    }

    /// Simulate a full path, drawing one deviate vector per step from `deviates`.
    pub fn simulate_path<S: DeviateSource>(
        &self,
        path_id: usize,
        deviates: &mut S,
    ) -> LfmResult<ForwardRatePath> {
        let m = self.rate_count();
        let steps = self.steps();
        let mut rates = Array2::<f64>::zeros((steps + 1, m));
        rates.row_mut(0).fill(self.initial_rate);

        let mut dw = vec![0.0; m];
        let mut z = vec![0.0; m];
        for l in 0..steps {
            deviates.fill_deviates(&mut dw);
            self.decomposer.generate_into(&dw, &mut z);
            let next = self
                .step(rates.row(l), &z)
                .map_err(|divergence| divergence.at(path_id, l))?;
            rates.row_mut(l + 1).assign(&next);
        }

        Ok(ForwardRatePath { rates })
    }

    fn drift_term(
        &self,
        k: usize,
        j: usize,
        f: f64,
        vk: f64,
        dt: f64,
    ) -> Result<f64, RateDivergence> {
        let tau = self.tenors[j];
        let denom = 1.0 + tau * f;
        if !f.is_finite() || denom <= 0.0 {
            return Err(RateDivergence {
                rate: j - 1,
                value: f,
            });
        }
        Ok(self.correlation.get(k, j) * tau * vk * f / denom * dt)
    }
}
