// src/analytics/black76.rs
//! Black-76 cap pricing
//!
//! # Mathematical Foundation
//!
//! A cap on the schedule `T_0 < T_1 < … < T_n` is a strip of caplets. The
//! caplet fixing at `T_i` and paying at `T_{i+1}` is worth
//! ```text
//! Cpl_i = L · δ_i · P(T_{i+1}) · [F_i Φ(d₁) − K Φ(d₂)]
//! d₁ = [ln(F_i/K) + σ_i² T_i / 2] / (σ_i √T_i),   d₂ = d₁ − σ_i √T_i
//! ```
//! with accrual `δ_i = T_{i+1} − T_i` and simple forward
//! `F_i = (P(T_i)/P(T_{i+1}) − 1) / δ_i`.

use crate::error::{validation::*, LfmError, LfmResult};
use crate::math_utils::norm_cdf;

fn validate_schedule(discounts: &[f64], expiries: &[f64]) -> LfmResult<()> {
    validate_len("discount factors", expiries.len(), discounts.len())?;
    if expiries.len() < 2 {
        return Err(LfmError::DimensionMismatch {
            what: "cap schedule (at least two dates)".to_string(),
            expected: 2,
            actual: expiries.len(),
        });
    }
    for &p in discounts {
        validate_positive("discount factor", p)?;
    }
    validate_non_negative("first expiry", expiries[0])?;
    for pair in expiries.windows(2) {
        validate_positive("accrual period", pair[1] - pair[0])?;
    }
    Ok(())
}

/// Simple forward rates implied by consecutive discount factors
pub fn forwards_from_discounts(discounts: &[f64], expiries: &[f64]) -> LfmResult<Vec<f64>> {
    validate_schedule(discounts, expiries)?;
    Ok(discounts
        .windows(2)
        .zip(expiries.windows(2))
        .map(|(p, t)| (p[0] / p[1] - 1.0) / (t[1] - t[0]))
        .collect())
}

/// Black-76 value of a single caplet
///
/// # Parameters
/// - `forward`: simple forward rate for the accrual period
/// - `strike`: cap rate K
/// - `vol`: Black volatility σ
/// - `expiry`: fixing time T_i
/// - `discount`: discount factor to the payment date
/// - `accrual`: period length δ
/// - `notional`: principal L
///
/// With zero variance the caplet is worth its discounted intrinsic value.
pub fn black76_caplet(
    forward: f64,
    strike: f64,
    vol: f64,
    expiry: f64,
    discount: f64,
    accrual: f64,
    notional: f64,
) -> f64 {
    let scale = notional * accrual * discount;
    let std_dev = vol * expiry.sqrt();
    if std_dev <= 0.0 || forward <= 0.0 || strike <= 0.0 {
        return scale * (forward - strike).max(0.0);
    }

    let d1 = ((forward / strike).ln() + 0.5 * std_dev * std_dev) / std_dev;
    let d2 = d1 - std_dev;
    scale * (forward * norm_cdf(d1) - strike * norm_cdf(d2))
}

/// Caplet values of a cap, one per accrual period
///
/// `vols` holds one Black volatility per caplet (`expiries.len() − 1`).
pub fn price_caps(
    discounts: &[f64],
    expiries: &[f64],
    cap_rate: f64,
    notional: f64,
    vols: &[f64],
) -> LfmResult<Vec<f64>> {
    let forwards = forwards_from_discounts(discounts, expiries)?;
    validate_len("caplet volatilities", forwards.len(), vols.len())?;
    validate_non_negative("cap rate", cap_rate)?;
    validate_positive("notional", notional)?;
    for &vol in vols {
        validate_non_negative("caplet volatility", vol)?;
    }

    Ok(forwards
        .iter()
        .enumerate()
        .map(|(i, &f)| {
            black76_caplet(
                f,
                cap_rate,
                vols[i],
                expiries[i],
                discounts[i + 1],
                expiries[i + 1] - expiries[i],
                notional,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_forwards_from_flat_curve() {
        let expiries: [f64; 3] = [1.0, 1.5, 2.0];
        let discounts: Vec<f64> = expiries.iter().map(|t: &f64| (-0.04 * t).exp()).collect();
        let forwards = forwards_from_discounts(&discounts, &expiries).unwrap();
        let expected = ((0.02f64).exp() - 1.0) / 0.5;
        for f in forwards {
            assert_abs_diff_eq!(f, expected, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_caplet_reference_value() {
        // F = K = 5%, σ = 20%, T = 1, δ = 0.5, P = 0.95, L = 100
        // d₁ = 0.1, d₂ = −0.1 → F (Φ(0.1) − Φ(−0.1)) = 0.05 · 0.0796557
        let value = black76_caplet(0.05, 0.05, 0.2, 1.0, 0.95, 0.5, 100.0);
        assert_abs_diff_eq!(value, 100.0 * 0.5 * 0.95 * 0.05 * 0.07965567455405798, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_volatility_is_intrinsic() {
        assert_abs_diff_eq!(
            black76_caplet(0.06, 0.05, 0.0, 1.0, 0.9, 0.5, 100.0),
            100.0 * 0.5 * 0.9 * 0.01,
            epsilon = 1e-12
        );
        assert_eq!(black76_caplet(0.04, 0.05, 0.0, 1.0, 0.9, 0.5, 100.0), 0.0);
    }

    #[test]
    fn test_cap_prices_increase_with_volatility() {
        let expiries: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
        let rates: [f64; 4] = [0.01, 0.02, 0.03, 0.04];
        let discounts: Vec<f64> = rates
            .iter()
            .zip(expiries.iter())
            .map(|(r, t): (&f64, &f64)| (-r * t).exp())
            .collect();
        let low = price_caps(&discounts, &expiries, 0.05, 100.0, &[0.2; 3]).unwrap();
        let high = price_caps(&discounts, &expiries, 0.05, 100.0, &[0.5; 3]).unwrap();
        assert_eq!(low.len(), 3);
        for (l, h) in low.iter().zip(high.iter()) {
            assert!(*l > 0.0);
            assert!(h > l);
        }
    }

    #[test]
    fn test_schedule_validation() {
        assert!(price_caps(&[0.99], &[1.0], 0.05, 100.0, &[]).is_err());
        assert!(matches!(
            price_caps(&[0.99, 0.98], &[1.0, 2.0], 0.05, 100.0, &[0.2, 0.2]),
            Err(LfmError::DimensionMismatch { .. })
        ));
        assert!(forwards_from_discounts(&[0.99, 0.98], &[2.0, 1.0]).is_err());
    }
}
