//! Swap Rate Valuation and Swaption Payoff
//!
//! # Mathematical Definitions
//!
//! For one step's forward-rate vector F and accruals τ:
//! ```text
//! P     = Π_{p=0}^{m−1} 1 / (1 + τ_p F_p)
//! A     = Σ_{n=1}^{m−1} τ_n · Π_{running}
//! S     = (1 − P) / A
//! value = max(S − K, 0) · A
//! ```
//!
//! The running product in the annuity is carried across the outer loop: for
//! each n it is multiplied by `1/(1 + τ_q F_q)` for every q in [1, n) before
//! `τ_n` times it is added to A.

use ndarray::ArrayView1;

/// Swap rate and annuity derived from one forward-rate vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapValuation {
    pub swap_rate: f64,
    pub annuity: f64,
    /// Product of the one-period discount factors
    pub discount_product: f64,
    /// Inverse of the last running annuity product; diagnostic only
    pub bond_price: f64,
}

/// Turns a step's forward rates into a swap rate and annuity factor.
#[derive(Debug, Clone, Copy)]
pub struct SwapRateValuer<'a> {
    tenors: &'a [f64],
}

impl<'a> SwapRateValuer<'a> {
    /// `tenors` must hold at least one accrual per rate.
    pub fn new(tenors: &'a [f64]) -> Self {
        SwapRateValuer { tenors }
    }

    pub fn value(&self, rates: ArrayView1<'_, f64>) -> SwapValuation {
        let m = rates.len();
        let tau = self.tenors;

        let mut prod = 1.0;
        for p in 0..m {
            prod *= 1.0 / (1.0 + tau[p] * rates[p]);
        }

        let mut prod1 = 1.0;
        let mut annuity = 0.0;
        for n in 1..m {
            for q in 1..n {
                prod1 *= 1.0 / (1.0 + tau[q] * rates[q]);
            }
            annuity += tau[n] * prod1;
        }

        SwapValuation {
            swap_rate: (1.0 - prod) / annuity,
            annuity,
            discount_product: prod,
            bond_price: 1.0 / prod1,
        }
    }
}

/// Payer swaption payoff in annuity units: `max(S − K, 0) · A`
pub fn payer_swaption_value(valuation: &SwapValuation, strike: f64) -> f64 {
    (valuation.swap_rate - strike).max(0.0) * valuation.annuity
}
