// src/error.rs
use std::fmt;

/// Error types for the lfm-mc library
#[derive(Debug, Clone, PartialEq)]
pub enum LfmError {
    /// Correlation input that is non-square, asymmetric or not positive semi-definite
    InvalidMatrix { reason: String },

    /// Inconsistent lengths between the volatility curve, tenor schedule, matrix and rate count
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid engine configuration (numeraire out of range, zero paths or steps, ...)
    ConfigurationError { field: String, reason: String },

    /// Forward rate became non-finite or left the log domain mid-path
    NumericalDivergence {
        path: usize,
        step: usize,
        rate: usize,
        value: f64,
    },

    /// Invalid parameter values for the analytic pricers
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Calibration failure
    CalibrationError {
        reason: String,
        current_error: Option<f64>,
    },

    /// The run was cancelled between paths
    Cancelled { completed_paths: usize },
}

impl fmt::Display for LfmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LfmError::InvalidMatrix { reason } => {
                write!(f, "Invalid correlation matrix: {}", reason)
            }
            LfmError::DimensionMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    what, expected, actual
                )
            }
            LfmError::ConfigurationError { field, reason } => {
                write!(f, "Invalid configuration for '{}': {}", field, reason)
            }
            LfmError::NumericalDivergence {
                path,
                step,
                rate,
                value,
            } => {
                write!(
                    f,
                    "Forward rate {} diverged on path {} at step {}: {}",
                    rate, path, step, value
                )
            }
            LfmError::InvalidParameters {
                parameter,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}' = {}: {}",
                    parameter, value, constraint
                )
            }
            LfmError::CalibrationError {
                reason,
                current_error,
            } => match current_error {
                Some(err) => write!(
                    f,
                    "Calibration failed (current error: {:.6}): {}",
                    err, reason
                ),
                None => write!(f, "Calibration failed: {}", reason),
            },
            LfmError::Cancelled { completed_paths } => {
                write!(f, "Simulation cancelled after {} paths", completed_paths)
            }
        }
    }
}

impl std::error::Error for LfmError {}

/// Result type alias for lfm-mc operations
pub type LfmResult<T> = Result<T, LfmError>;

/// Validation utilities
pub mod validation {
    use super::{LfmError, LfmResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> LfmResult<()> {
        if value > 0.0 {
            Ok(())
        } else {
            Err(LfmError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> LfmResult<()> {
        if value >= 0.0 {
            Ok(())
        } else {
            Err(LfmError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> LfmResult<()> {
        if !value.is_finite() {
            Err(LfmError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that two lengths agree
    pub fn validate_len(what: &str, expected: usize, actual: usize) -> LfmResult<()> {
        if expected != actual {
            Err(LfmError::DimensionMismatch {
                what: what.to_string(),
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }

    /// Validate paths count. Two paths are the minimum for a standard error.
    pub fn validate_paths(paths: usize) -> LfmResult<()> {
        if paths < 2 {
            Err(LfmError::ConfigurationError {
                field: "paths".to_string(),
                reason: "must be at least 2".to_string(),
            })
        } else if paths > 1_000_000_000 {
            Err(LfmError::ConfigurationError {
                field: "paths".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> LfmResult<()> {
        if steps == 0 {
            Err(LfmError::ConfigurationError {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > 100_000 {
            Err(LfmError::ConfigurationError {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate the numeraire index against the rate count: `1 <= numeraire < rates`
    pub fn validate_numeraire(numeraire: usize, rates: usize) -> LfmResult<()> {
        if numeraire == 0 || numeraire >= rates {
            Err(LfmError::ConfigurationError {
                field: "numeraire".to_string(),
                reason: format!("must be in [1, {}), got {}", rates, numeraire),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("maturity", 1.0).is_ok());
        assert!(validate_positive("maturity", 0.0).is_err());
        assert!(validate_positive("maturity", -0.5).is_err());
        assert!(validate_positive("maturity", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
        assert!(validate_finite("value", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_numeraire() {
        assert!(validate_numeraire(1, 10).is_ok());
        assert!(validate_numeraire(9, 10).is_ok());
        assert!(matches!(
            validate_numeraire(0, 10),
            Err(LfmError::ConfigurationError { .. })
        ));
        assert!(validate_numeraire(10, 10).is_err());
    }

    #[test]
    fn test_validate_paths_and_steps() {
        assert!(validate_paths(1).is_err());
        assert!(validate_paths(2).is_ok());
        assert!(validate_steps(0).is_err());
        assert!(validate_steps(10).is_ok());
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let error = validate_len("tenor schedule", 10, 7).unwrap_err();
        let display = format!("{}", error);
        assert!(display.contains("tenor schedule"));
        assert!(display.contains("10"));
        assert!(display.contains("7"));
    }

    #[test]
    fn test_divergence_display() {
        let error = LfmError::NumericalDivergence {
            path: 12,
            step: 3,
            rate: 4,
            value: f64::INFINITY,
        };

        let display = format!("{}", error);
        assert!(display.contains("path 12"));
        assert!(display.contains("step 3"));
        assert!(display.contains("inf"));
    }
}
