//! Payoff accumulation and final statistics
//!
//! Each worker keeps a [`PartialSums`] for its block of paths. A path
//! contributes one total `x`, the sum of its per-step swaption values, so the
//! estimator statistics are taken over M independent samples:
//! ```text
//! price = e^(−F₀T) · Σx / M
//! SD    = e^(−F₀T) · √((Σx² − (Σx)²/M) / (M − 1))
//! SE    = SD / √M
//! ```
//! This stands in for the simpler `√(Σx² − (Σx)²/M) · e^(−2F₀T/(M−1))`,
//! which does not shrink with M.

use crate::error::{LfmError, LfmResult};
use serde::{Deserialize, Serialize};

/// Outcome of one Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub price: f64,
    pub standard_deviation: f64,
    pub standard_error: f64,
    /// Paths that entered the estimate
    pub paths: usize,
    /// Paths dropped after a numerical divergence
    pub excluded_paths: usize,
}

/// Running sums over a block of paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialSums {
    pub sum: f64,
    pub sum_sq: f64,
    pub accepted: usize,
    pub excluded: usize,
    first_divergence: Option<LfmError>,
}

impl PartialSums {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_path(&mut self, total: f64) {
        self.sum += total;
        self.sum_sq += total * total;
        self.accepted += 1;
    }

    /// Record a path that diverged. The earliest error is kept for reporting.
    pub fn exclude(&mut self, error: LfmError) {
        self.excluded += 1;
        if self.first_divergence.is_none() {
            self.first_divergence = Some(error);
        }
    }

    /// Fold the sums of the block that follows this one.
    pub fn merge(&mut self, other: PartialSums) {
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.accepted += other.accepted;
        self.excluded += other.excluded;
        if self.first_divergence.is_none() {
            self.first_divergence = other.first_divergence;
        }
    }

    pub fn first_divergence(&self) -> Option<&LfmError> {
        self.first_divergence.as_ref()
    }

    /// Discount and normalise the sums.
    ///
    /// Fails when fewer than two paths survived, with the first divergence
    /// if there was one.
    pub fn finalize(self, initial_rate: f64, maturity: f64) -> LfmResult<SimulationResult> {
        if self.accepted < 2 {
            return Err(self.first_divergence.unwrap_or(LfmError::ConfigurationError {
                field: "paths".to_string(),
                reason: format!(
                    "at least 2 paths are needed for a standard error, got {}",
                    self.accepted
                ),
            }));
        }

        let m = self.accepted as f64;
        let discount = (-initial_rate * maturity).exp();
        let variance = ((self.sum_sq - self.sum * self.sum / m) / (m - 1.0)).max(0.0);
        let standard_deviation = discount * variance.sqrt();

        Ok(SimulationResult {
            price: discount * self.sum / m,
            standard_deviation,
            standard_error: standard_deviation / m.sqrt(),
            paths: self.accepted,
            excluded_paths: self.excluded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn divergence(path: usize) -> LfmError {
        LfmError::NumericalDivergence {
            path,
            step: 0,
            rate: 1,
            value: f64::INFINITY,
        }
    }

    #[test]
    fn test_sample_statistics() {
        let mut sums = PartialSums::new();
        for x in [1.0, 2.0, 3.0, 4.0] {
            sums.add_path(x);
        }
        let result = sums.finalize(0.0, 1.0).unwrap();

        // mean 2.5, sample variance 5/3
        assert_abs_diff_eq!(result.price, 2.5, epsilon = 1e-15);
        assert_abs_diff_eq!(result.standard_deviation, (5.0f64 / 3.0).sqrt(), epsilon = 1e-14);
        assert_abs_diff_eq!(
            result.standard_error,
            (5.0f64 / 3.0).sqrt() / 2.0,
            epsilon = 1e-14
        );
        assert_eq!(result.paths, 4);
        assert_eq!(result.excluded_paths, 0);
    }

    #[test]
    fn test_standard_error_shrinks_with_path_count() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        let mut once = PartialSums::new();
        let mut four_times = PartialSums::new();
        for x in samples {
            once.add_path(x);
        }
        for _ in 0..4 {
            for x in samples {
                four_times.add_path(x);
            }
        }
        let small = once.finalize(0.05, 1.0).unwrap();
        let large = four_times.finalize(0.05, 1.0).unwrap();

        // same spread, four times the paths: SE falls by √((M−1)/(4M−1))
        let expected = (3.0f64 / 15.0).sqrt();
        assert_abs_diff_eq!(large.standard_error / small.standard_error, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(large.price, small.price, epsilon = 1e-15);
    }

    #[test]
    fn test_discounting() {
        let mut sums = PartialSums::new();
        sums.add_path(1.0);
        sums.add_path(3.0);
        let result = sums.finalize(0.05, 2.0).unwrap();

        let discount = (-0.1f64).exp();
        assert_abs_diff_eq!(result.price, 2.0 * discount, epsilon = 1e-15);
        assert_abs_diff_eq!(result.standard_deviation, 2.0f64.sqrt() * discount, epsilon = 1e-14);
    }

    #[test]
    fn test_merge_matches_single_block() {
        let values = [0.3, 0.0, 1.2, 0.7, 0.0, 2.1];
        let mut whole = PartialSums::new();
        values.iter().for_each(|&x| whole.add_path(x));

        let mut left = PartialSums::new();
        let mut right = PartialSums::new();
        values[..2].iter().for_each(|&x| left.add_path(x));
        values[2..].iter().for_each(|&x| right.add_path(x));
        left.merge(right);

        assert_eq!(left.accepted, whole.accepted);
        assert_abs_diff_eq!(left.sum, whole.sum, epsilon = 1e-15);
        assert_abs_diff_eq!(left.sum_sq, whole.sum_sq, epsilon = 1e-14);
    }

    #[test]
    fn test_constant_payoff_has_zero_spread() {
        let mut sums = PartialSums::new();
        for _ in 0..10 {
            sums.add_path(0.1);
        }
        let result = sums.finalize(0.05, 1.0).unwrap();
        assert!(result.standard_deviation < 1e-7);
        assert!(result.standard_error >= 0.0);
    }

    #[test]
    fn test_exclusions_are_counted() {
        let mut left = PartialSums::new();
        left.add_path(1.0);
        left.exclude(divergence(1));

        let mut right = PartialSums::new();
        right.exclude(divergence(5));
        right.add_path(2.0);
        left.merge(right);

        assert_eq!(left.excluded, 2);
        assert!(matches!(
            left.first_divergence(),
            Some(LfmError::NumericalDivergence { path: 1, .. })
        ));
        let result = left.finalize(0.0, 1.0).unwrap();
        assert_eq!(result.paths, 2);
        assert_eq!(result.excluded_paths, 2);
    }

    #[test]
    fn test_too_few_paths_reports_divergence() {
        let mut sums = PartialSums::new();
        sums.add_path(1.0);
        sums.exclude(divergence(3));
        let err = sums.finalize(0.05, 1.0).unwrap_err();
        assert!(matches!(err, LfmError::NumericalDivergence { path: 3, .. }));

        let err = PartialSums::new().finalize(0.05, 1.0).unwrap_err();
        assert!(matches!(err, LfmError::ConfigurationError { .. }));
    }
}
