//! Forward-Rate Correlation and Its Square-Root Factors
//!
//! # Mathematical Framework
//!
//! Correlated Brownian increments are built from independent draws:
//! ```text
//! z = A · dW,   with   A · Aᵀ = R
//! ```
//! where `dW` holds m independent N(0,1) draws and R is the m×m correlation
//! matrix of the forward rates.
//!
//! # Factorizations
//!
//! 1. **Eigen**: `R = V D Vᵀ`, `A = V √D`. Negative eigenvalues produced by
//!    rounding in quoted correlations are clamped to zero before the root.
//! 2. **Cholesky**: `R = L Lᵀ` with L lower-triangular, `A = L`. Pivots in
//!    `[-tol, 0)` are treated as zero so singular matrices still factor.
//!    Positive pivots are kept however small, down to rounding noise.
//!
//! Both give the same distribution for z. The factor is computed once per
//! run and shared read-only by every worker.

use crate::error::{LfmError, LfmResult};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Default tolerance for the positive semi-definite check.
///
/// Market correlations quoted to three decimals carry rounding noise of
/// this order in their smallest eigenvalues.
pub const DEFAULT_PSD_TOLERANCE: f64 = 1e-2;

const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Cholesky pivots (on the variance scale) at or below this are treated as zero.
const PIVOT_FLOOR: f64 = 1e-14;

/// Sample forward-rate correlations (lower triangle, 10 rates).
const REFERENCE_LOWER_TRIANGLE: [&[f64]; 10] = [
    &[1.0],
    &[0.924, 1.0],
    &[0.707, 0.924, 1.0],
    &[0.557, 0.833, 0.981, 1.0],
    &[0.454, 0.760, 0.951, 0.997, 1.0],
    &[0.760, 0.951, 0.997, 0.963, 0.924, 1.0],
    &[0.843, 0.985, 0.976, 0.916, 0.862, 0.990, 1.0],
    &[0.837, 0.983, 0.979, 0.921, 0.867, 0.992, 1.0, 1.0],
    &[0.837, 0.983, 0.979, 0.920, 0.867, 0.992, 1.0, 1.0, 1.0],
    &[0.920, 1.00, 0.928, 0.838, 0.767, 0.954, 0.986, 0.985, 0.985, 1.00],
];

/// Factorization strategy used to correlate independent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Decomposition {
    #[default]
    Eigen,
    Cholesky,
}

/// Symmetric correlation matrix with unit diagonal and entries in [-1, 1].
///
/// Positive semi-definiteness depends on a tolerance and is checked when
/// the matrix is decomposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CorrelationMatrix {
    rows: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> LfmResult<Self> {
        let m = rows.len();
        if m == 0 {
            return Err(invalid("matrix is empty"));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != m) {
            return Err(invalid(format!(
                "matrix is not square: row {} has {} entries, expected {}",
                i,
                row.len(),
                m
            )));
        }

        for i in 0..m {
            if !rows[i][i].is_finite() || (rows[i][i] - 1.0).abs() > SYMMETRY_TOLERANCE {
                return Err(invalid(format!(
                    "diagonal entry ({}, {}) must be 1, got {}",
                    i, i, rows[i][i]
                )));
            }
            for j in 0..m {
                let rho = rows[i][j];
                if !rho.is_finite() || !(-1.0..=1.0).contains(&rho) {
                    return Err(invalid(format!(
                        "entry ({}, {}) = {} is outside [-1, 1]",
                        i, j, rho
                    )));
                }
                if (rho - rows[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(invalid(format!(
                        "matrix is not symmetric at ({}, {}): {} vs {}",
                        i, j, rho, rows[j][i]
                    )));
                }
            }
        }

        Ok(Self { rows })
    }

    /// Build the full matrix from its lower triangle, row `i` holding `i + 1` entries.
    pub fn from_lower_triangle<R: AsRef<[f64]>>(lower: &[R]) -> LfmResult<Self> {
        let m = lower.len();
        let mut rows = vec![vec![0.0; m]; m];
        for (i, row) in lower.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != i + 1 {
                return Err(invalid(format!(
                    "lower-triangle row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    i + 1
                )));
            }
            for (j, &rho) in row.iter().enumerate() {
                rows[i][j] = rho;
                rows[j][i] = rho;
            }
        }
        Self::new(rows)
    }

    pub fn identity(m: usize) -> LfmResult<Self> {
        Self::new(
            (0..m)
                .map(|i| (0..m).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect(),
        )
    }

    /// The 10×10 sample correlation matrix of the reference configuration.
    pub fn reference() -> Self {
        let m = REFERENCE_LOWER_TRIANGLE.len();
        let mut rows = vec![vec![0.0; m]; m];
        for (i, row) in REFERENCE_LOWER_TRIANGLE.iter().enumerate() {
            for (j, &rho) in row.iter().enumerate() {
                rows[i][j] = rho;
                rows[j][i] = rho;
            }
        }
        Self { rows }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Smallest eigenvalue of the matrix.
    pub fn min_eigenvalue(&self) -> f64 {
        self.symmetric_eigen()
            .eigenvalues
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    fn to_dmatrix(&self) -> DMatrix<f64> {
        let m = self.dim();
        DMatrix::from_fn(m, m, |i, j| self.rows[i][j])
    }

    fn symmetric_eigen(&self) -> SymmetricEigen<f64, nalgebra::Dynamic> {
        SymmetricEigen::new(self.to_dmatrix())
    }
}

impl TryFrom<Vec<Vec<f64>>> for CorrelationMatrix {
    type Error = LfmError;

    fn try_from(rows: Vec<Vec<f64>>) -> LfmResult<Self> {
        Self::new(rows)
    }
}

impl From<CorrelationMatrix> for Vec<Vec<f64>> {
    fn from(matrix: CorrelationMatrix) -> Self {
        matrix.rows
    }
}

/// Linear operator mapping m independent N(0,1) draws to one correlated vector.
#[derive(Debug, Clone)]
pub struct CorrelationDecomposer {
    strategy: Decomposition,
    factor: Array2<f64>,
}

impl CorrelationDecomposer {
    pub fn new(
        matrix: &CorrelationMatrix,
        strategy: Decomposition,
        tolerance: f64,
    ) -> LfmResult<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(LfmError::ConfigurationError {
                field: "psd_tolerance".to_string(),
                reason: format!("must be finite and non-negative, got {}", tolerance),
            });
        }

        let eigen = matrix.symmetric_eigen();
        let min_eigenvalue = eigen
            .eigenvalues
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        if min_eigenvalue < -tolerance {
            return Err(invalid(format!(
                "matrix is not positive semi-definite: smallest eigenvalue {:.6e} < -{:.1e}",
                min_eigenvalue, tolerance
            )));
        }

        let factor = match strategy {
            Decomposition::Eigen => {
                let m = matrix.dim();
                let roots: Vec<f64> = eigen.eigenvalues.iter().map(|d| d.max(0.0).sqrt()).collect();
                Array2::from_shape_fn((m, m), |(i, j)| eigen.eigenvectors[(i, j)] * roots[j])
            }
            Decomposition::Cholesky => cholesky_lower_psd(matrix, tolerance)?,
        };

        Ok(Self { strategy, factor })
    }

    pub fn eigen(matrix: &CorrelationMatrix, tolerance: f64) -> LfmResult<Self> {
        Self::new(matrix, Decomposition::Eigen, tolerance)
    }

    pub fn cholesky(matrix: &CorrelationMatrix, tolerance: f64) -> LfmResult<Self> {
        Self::new(matrix, Decomposition::Cholesky, tolerance)
    }

    pub fn strategy(&self) -> Decomposition {
        self.strategy
    }

    pub fn dim(&self) -> usize {
        self.factor.nrows()
    }

    /// The square-root factor `A` with `A · Aᵀ ≈ R`.
    pub fn factor(&self) -> &Array2<f64> {
        &self.factor
    }

    /// Correlate one vector of independent draws.
    pub fn generate(&self, dw: &[f64]) -> LfmResult<Vec<f64>> {
        if dw.len() != self.dim() {
            return Err(LfmError::DimensionMismatch {
                what: "independent deviates".to_string(),
                expected: self.dim(),
                actual: dw.len(),
            });
        }
        let mut out = vec![0.0; dw.len()];
        self.generate_into(dw, &mut out);
        Ok(out)
    }

    /// Allocation-free variant of [`generate`](Self::generate); lengths must match.
    pub fn generate_into(&self, dw: &[f64], out: &mut [f64]) {
        debug_assert_eq!(dw.len(), self.dim());
        debug_assert_eq!(out.len(), self.dim());

        let m = self.dim();
        for (i, z) in out.iter_mut().enumerate() {
            let upper = match self.strategy {
                Decomposition::Eigen => m,
                Decomposition::Cholesky => i + 1,
            };
            let row = self.factor.row(i);
            let mut sum = 0.0;
            for j in 0..upper {
                sum += row[j] * dw[j];
            }
            *z = sum;
        }
    }
}

/// Lower Cholesky factor of a positive semi-definite matrix.
fn cholesky_lower_psd(matrix: &CorrelationMatrix, tolerance: f64) -> LfmResult<Array2<f64>> {
    let m = matrix.dim();
    let mut l = Array2::<f64>::zeros((m, m));

    for i in 0..m {
        for j in 0..=i {
            let mut sum = matrix.get(i, j);
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }

            if i == j {
                if sum < -tolerance {
                    return Err(invalid(format!(
                        "Cholesky pivot {} is negative: {:.6e}",
                        i, sum
                    )));
                }
                l[[i, i]] = sum.max(0.0).sqrt();
            } else if l[[j, j]] * l[[j, j]] > PIVOT_FLOOR {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    Ok(l)
}

fn invalid(reason: impl Into<String>) -> LfmError {
    LfmError::InvalidMatrix {
        reason: reason.into(),
    }
}
