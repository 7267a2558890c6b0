// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European options and Greeks
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model with continuous dividend yield q:
//! ```text
//! dS_t = (r − q) S_t dt + σ S_t dW_t
//! ```
//!
//! European calls and puts have closed forms in
//! ```text
//! d₁ = [ln(S/K) + (r − q + σ²/2)T] / (σ√T)
//! d₂ = d₁ − σ√T
//! ```

use crate::error::{validation::*, LfmResult};
use crate::math_utils::{norm_cdf, norm_pdf};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GreeksConfig: u32 {
        const NONE  = 0;
        const DELTA = 1 << 0;
        const VEGA  = 1 << 1;
        const RHO   = 1 << 2;
        const GAMMA = 1 << 3;
        const THETA = 1 << 4;
        const ALL   = Self::DELTA.bits()
            | Self::VEGA.bits()
            | Self::RHO.bits()
            | Self::GAMMA.bits()
            | Self::THETA.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// Sensitivities selected by a [`GreeksConfig`]; unselected ones are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub rho: Option<f64>,
}

fn validate_inputs(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> LfmResult<()> {
    validate_positive("spot", s)?;
    validate_positive("strike", k)?;
    validate_finite("rate", r)?;
    validate_finite("dividend_yield", q)?;
    validate_positive("volatility", sigma)?;
    validate_positive("expiry", t)?;
    Ok(())
}

fn d1_d2(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> (f64, f64) {
    let sig_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

/// Black-Scholes European call price
///
/// ```text
/// C = S e^(−qT) Φ(d₁) − K e^(−rT) Φ(d₂)
/// ```
pub fn bs_call_price(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    s * (-q * t).exp() * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Black-Scholes European put price
///
/// ```text
/// P = K e^(−rT) Φ(−d₂) − S e^(−qT) Φ(−d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    k * (-r * t).exp() * norm_cdf(-d2) - s * (-q * t).exp() * norm_cdf(-d1)
}

/// Validated price of a European option
pub fn bs_price(
    option_type: OptionType,
    s: f64,
    k: f64,
    r: f64,
    q: f64,
    sigma: f64,
    t: f64,
) -> LfmResult<f64> {
    validate_inputs(s, k, r, q, sigma, t)?;
    Ok(match option_type {
        OptionType::Call => bs_call_price(s, k, r, q, sigma, t),
        OptionType::Put => bs_put_price(s, k, r, q, sigma, t),
    })
}

/// Closed-form Greeks of a European option
///
/// # Formulas
/// ```text
/// Δ_call = e^(−qT) Φ(d₁)               Δ_put = e^(−qT) (Φ(d₁) − 1)
/// Γ      = e^(−qT) φ(d₁) / (S σ √T)
/// ν      = S e^(−qT) φ(d₁) √T
/// Θ_call = −S e^(−qT) φ(d₁) σ / (2√T) + q S e^(−qT) Φ(d₁) − r K e^(−rT) Φ(d₂)
/// Θ_put  = −S e^(−qT) φ(d₁) σ / (2√T) − q S e^(−qT) Φ(−d₁) + r K e^(−rT) Φ(−d₂)
/// ρ_call = K T e^(−rT) Φ(d₂)           ρ_put = −K T e^(−rT) Φ(−d₂)
/// ```
/// Theta is per year, vega and rho per unit change.
#[allow(clippy::too_many_arguments)]
pub fn bs_greeks(
    option_type: OptionType,
    s: f64,
    k: f64,
    r: f64,
    q: f64,
    sigma: f64,
    t: f64,
    which: GreeksConfig,
) -> LfmResult<Greeks> {
    validate_inputs(s, k, r, q, sigma, t)?;

    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    let sqrt_t = t.sqrt();
    let div_df = (-q * t).exp();
    let df = (-r * t).exp();
    let pdf_d1 = norm_pdf(d1);
    let is_call = option_type == OptionType::Call;

    let mut greeks = Greeks::default();
    if which.contains(GreeksConfig::DELTA) {
        greeks.delta = Some(if is_call {
            div_df * norm_cdf(d1)
        } else {
            div_df * (norm_cdf(d1) - 1.0)
        });
    }
    if which.contains(GreeksConfig::GAMMA) {
        greeks.gamma = Some(div_df * pdf_d1 / (s * sigma * sqrt_t));
    }
    if which.contains(GreeksConfig::VEGA) {
        greeks.vega = Some(s * div_df * pdf_d1 * sqrt_t);
    }
    if which.contains(GreeksConfig::THETA) {
        let decay = -s * div_df * pdf_d1 * sigma / (2.0 * sqrt_t);
        greeks.theta = Some(if is_call {
            decay + q * s * div_df * norm_cdf(d1) - r * k * df * norm_cdf(d2)
        } else {
            decay - q * s * div_df * norm_cdf(-d1) + r * k * df * norm_cdf(-d2)
        });
    }
    if which.contains(GreeksConfig::RHO) {
        greeks.rho = Some(if is_call {
            k * t * df * norm_cdf(d2)
        } else {
            -k * t * df * norm_cdf(-d2)
        });
    }

    Ok(greeks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reference_call_price() {
        let price = bs_price(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.2, 1.0).unwrap();
        assert_abs_diff_eq!(price, 10.4506, epsilon = 1e-4);
    }

    #[test]
    fn test_put_call_parity_with_dividends() {
        let (s, k, r, q, sigma, t) = (100.0, 110.0, 0.03, 0.02, 0.25, 2.0);
        let call = bs_call_price(s, k, r, q, sigma, t);
        let put = bs_put_price(s, k, r, q, sigma, t);
        let forward_parity = s * (-q * t).exp() - k * (-r * t).exp();
        assert_abs_diff_eq!(call - put, forward_parity, epsilon = 1e-12);
    }

    #[test]
    fn test_selected_greeks_only() {
        let greeks = bs_greeks(
            OptionType::Call,
            100.0,
            100.0,
            0.05,
            0.0,
            0.2,
            1.0,
            GreeksConfig::DELTA | GreeksConfig::GAMMA,
        )
        .unwrap();
        assert!(greeks.delta.is_some());
        assert!(greeks.gamma.is_some());
        assert!(greeks.vega.is_none());
        assert!(greeks.theta.is_none());
        assert!(greeks.rho.is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(bs_price(OptionType::Put, 0.0, 100.0, 0.05, 0.0, 0.2, 1.0).is_err());
        assert!(bs_price(OptionType::Put, 100.0, 100.0, 0.05, 0.0, 0.0, 1.0).is_err());
        assert!(bs_price(OptionType::Put, 100.0, 100.0, f64::NAN, 0.0, 0.2, 1.0).is_err());
    }
}
