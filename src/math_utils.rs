// src/math_utils.rs
use crate::error::{LfmError, LfmResult};
use statrs::function::erf;
use std::f64::consts::{PI, SQRT_2};

pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf::erf(x / SQRT_2))
}

pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Composite Simpson's rule over `[a, b]` with `n` segments.
///
/// `n` must be even and positive. `b < a` integrates with a negative sign.
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, n: usize) -> LfmResult<f64> {
    if n == 0 || n % 2 != 0 {
        return Err(LfmError::InvalidParameters {
            parameter: "segments".to_string(),
            value: n as f64,
            constraint: "must be a positive even number".to_string(),
        });
    }

    let h = (b - a) / n as f64;
    let mut odd = 0.0;
    let mut even = 0.0;
    for i in 1..n {
        let x = a + i as f64 * h;
        if i % 2 == 1 {
            odd += f(x);
        } else {
            even += f(x);
        }
    }

    Ok(h / 3.0 * (f(a) + 4.0 * odd + 2.0 * even + f(b)))
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_norm_cdf_symmetry() {
        assert_abs_diff_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        for &x in &[0.3, 1.0, 1.96, 3.5] {
            assert_abs_diff_eq!(norm_cdf(x) + norm_cdf(-x), 1.0, epsilon = 1e-14);
        }
        // statrs' erf is good to roughly 1e-12
        assert_abs_diff_eq!(norm_cdf(1.96), 0.9750021048517795, epsilon = 1e-10);
    }

    #[test]
    fn test_simpson_exact_for_cubics() {
        let value = simpson(|x| x * x * x - 2.0 * x + 1.0, 0.0, 2.0, 2).unwrap();
        // ∫₀² (x³ - 2x + 1) dx = 4 - 4 + 2
        assert_abs_diff_eq!(value, 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_simpson_exponential() {
        let value = simpson(f64::exp, 0.0, 1.0, 100).unwrap();
        assert_abs_diff_eq!(value, std::f64::consts::E - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simpson_rejects_odd_segments() {
        assert!(simpson(|x| x, 0.0, 1.0, 3).is_err());
        assert!(simpson(|x| x, 0.0, 1.0, 0).is_err());
    }
}
