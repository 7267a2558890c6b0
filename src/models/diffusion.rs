// src/models/diffusion.rs
//! One-dimensional diffusion processes `dX = a(X, t) dt + b(X, t) dW`
//!
//! The conditional moments default to the one-step Euler approximation
//! ```text
//! E[X_{t+Δt} | X_t = x] ≈ x + a(x, t)·Δt
//! Var[X_{t+Δt} | X_t = x] ≈ b(x, t)²·Δt
//! ```
//! and are overridden where a closed form exists.

use crate::error::{validation::*, LfmResult};

pub trait DiffusionProcess {
    /// Initial value
    fn x0(&self) -> f64;
    fn drift(&self, x: f64, t: f64) -> f64;
    fn diffusion(&self, x: f64, t: f64) -> f64;

    fn expectation(&self, x0: f64, t0: f64, dt: f64) -> f64 {
        x0 + self.drift(x0, t0) * dt
    }

    fn variance(&self, x0: f64, t0: f64, dt: f64) -> f64 {
        let sigma = self.diffusion(x0, t0);
        sigma * sigma * dt
    }
}

/// Log-price of a Black-Scholes asset: `d ln S = (r − σ²/2) dt + σ dW`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesProcess {
    pub rate: f64,
    pub volatility: f64,
    pub x0: f64,
}

impl BlackScholesProcess {
    pub fn new(rate: f64, volatility: f64, x0: f64) -> LfmResult<Self> {
        validate_finite("rate", rate)?;
        validate_non_negative("volatility", volatility)?;
        validate_finite("x0", x0)?;
        Ok(BlackScholesProcess {
            rate,
            volatility,
            x0,
        })
    }
}

impl DiffusionProcess for BlackScholesProcess {
    fn x0(&self) -> f64 {
        self.x0
    }

    fn drift(&self, _x: f64, _t: f64) -> f64 {
        self.rate - 0.5 * self.volatility * self.volatility
    }

    fn diffusion(&self, _x: f64, _t: f64) -> f64 {
        self.volatility
    }
}

/// Mean-zero Ornstein-Uhlenbeck process `dX = −κX dt + σ dW`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnsteinUhlenbeck {
    pub speed: f64,
    pub volatility: f64,
    pub x0: f64,
}

impl OrnsteinUhlenbeck {
    pub fn new(speed: f64, volatility: f64, x0: f64) -> LfmResult<Self> {
        validate_positive("speed", speed)?;
        validate_non_negative("volatility", volatility)?;
        validate_finite("x0", x0)?;
        Ok(OrnsteinUhlenbeck {
            speed,
            volatility,
            x0,
        })
    }
}

impl DiffusionProcess for OrnsteinUhlenbeck {
    fn x0(&self) -> f64 {
        self.x0
    }

    fn drift(&self, x: f64, _t: f64) -> f64 {
        -self.speed * x
    }

    fn diffusion(&self, _x: f64, _t: f64) -> f64 {
        self.volatility
    }

    fn expectation(&self, x0: f64, _t0: f64, dt: f64) -> f64 {
        x0 * (-self.speed * dt).exp()
    }

    fn variance(&self, _x0: f64, _t0: f64, dt: f64) -> f64 {
        0.5 * self.volatility * self.volatility / self.speed * (1.0 - (-2.0 * self.speed * dt).exp())
    }
}

/// Square-root (CIR) process `dX = a(b − X) dt + σ√X dW`
///
/// The diffusion uses `max(X, 0)` so a discretized path that dips below zero
/// keeps a real coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRoot {
    pub mean: f64,
    pub speed: f64,
    pub volatility: f64,
    pub x0: f64,
}

impl SquareRoot {
    pub fn new(mean: f64, speed: f64, volatility: f64, x0: f64) -> LfmResult<Self> {
        validate_finite("mean", mean)?;
        validate_non_negative("speed", speed)?;
        validate_non_negative("volatility", volatility)?;
        validate_non_negative("x0", x0)?;
        Ok(SquareRoot {
            mean,
            speed,
            volatility,
            x0,
        })
    }
}

impl DiffusionProcess for SquareRoot {
    fn x0(&self) -> f64 {
        self.x0
    }

    fn drift(&self, x: f64, _t: f64) -> f64 {
        self.speed * (self.mean - x)
    }

    fn diffusion(&self, x: f64, _t: f64) -> f64 {
        self.volatility * x.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_black_scholes_moments() {
        let bs = BlackScholesProcess::new(0.01, 0.4, 0.0).unwrap();
        assert_abs_diff_eq!(bs.variance(1.0, 1.0, 1.0), 0.16, epsilon = 1e-15);
        assert_abs_diff_eq!(bs.expectation(1.0, 1.0, 1.0), 1.0 - 0.07, epsilon = 1e-15);
    }

    #[test]
    fn test_ornstein_uhlenbeck_closed_form() {
        let ou = OrnsteinUhlenbeck::new(0.001, 0.1, 0.0).unwrap();
        assert_abs_diff_eq!(ou.expectation(1.0, 1.0, 1.0), (-0.001f64).exp(), epsilon = 1e-15);
        // small speed: variance tends to σ²Δt
        assert_abs_diff_eq!(ou.variance(1.0, 1.0, 1.0), 0.01, epsilon = 1e-4);
        assert!(OrnsteinUhlenbeck::new(0.0, 0.1, 0.0).is_err());
    }

    #[test]
    fn test_square_root_moments() {
        let sr = SquareRoot::new(0.1, 0.01, 0.4, 0.0).unwrap();
        assert_abs_diff_eq!(sr.variance(1.0, 1.0, 1.0), 0.16, epsilon = 1e-15);
        assert_abs_diff_eq!(sr.expectation(1.0, 1.0, 1.0), 1.0 - 0.009, epsilon = 1e-15);
        assert_eq!(sr.diffusion(-0.5, 0.0), 0.0);
    }
}
