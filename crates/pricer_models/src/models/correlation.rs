//! Instantaneous correlation of Brownian drivers.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// How the forward-rate correlation matrix is specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrelationSpec {
    /// `rho_ij = exp(-decay * |T_i - T_j|)`
    Exponential {
        /// Decay parameter (>= 0)
        decay: f64,
    },
    /// Explicit symmetric matrix with unit diagonal.
    Matrix {
        /// Rows of the matrix
        rows: Vec<Vec<f64>>,
    },
}

impl Default for CorrelationSpec {
    fn default() -> Self {
        CorrelationSpec::Exponential { decay: 0.1 }
    }
}

impl CorrelationSpec {
    /// Materialise the matrix for forwards resetting at `times`.
    pub fn matrix(&self, times: &[f64]) -> Result<DMatrix<f64>, ModelError> {
        let n = times.len();
        match self {
            CorrelationSpec::Exponential { decay } => {
                if !(*decay >= 0.0) || !decay.is_finite() {
                    return Err(ModelError::InvalidParameter {
                        name: "correlation_decay",
                        value: *decay,
                    });
                }
                Ok(DMatrix::from_fn(n, n, |i, j| {
                    (-decay * (times[i] - times[j]).abs()).exp()
                }))
            }
            CorrelationSpec::Matrix { rows } => {
                if rows.len() != n || rows.iter().any(|r| r.len() != n) {
                    return Err(ModelError::DimensionMismatch {
                        what: "correlation matrix",
                        expected: n,
                        got: rows.len(),
                    });
                }
                let m = DMatrix::from_fn(n, n, |i, j| rows[i][j]);
                validate_correlation(&m)?;
                Ok(m)
            }
        }
    }
}

/// Check symmetry, unit diagonal and bounds.
pub fn validate_correlation(m: &DMatrix<f64>) -> Result<(), ModelError> {
    let n = m.nrows();
    for i in 0..n {
        if (m[(i, i)] - 1.0).abs() > 1e-12 {
            return Err(ModelError::InvalidCorrelation(format!(
                "diagonal entry {i} is {}",
                m[(i, i)]
            )));
        }
        for j in 0..i {
            let v = m[(i, j)];
            if !v.is_finite() || v.abs() > 1.0 {
                return Err(ModelError::InvalidCorrelation(format!(
                    "entry ({i}, {j}) = {v} outside [-1, 1]"
                )));
            }
            if (v - m[(j, i)]).abs() > 1e-12 {
                return Err(ModelError::InvalidCorrelation(format!(
                    "matrix is not symmetric at ({i}, {j})"
                )));
            }
        }
    }
    Ok(())
}

/// Lower Cholesky factor of a correlation matrix.
pub fn cholesky_lower(m: DMatrix<f64>) -> Result<DMatrix<f64>, ModelError> {
    m.cholesky()
        .map(|c| c.l())
        .ok_or(ModelError::CorrelationNotPositiveDefinite)
}

/// `out = L * z` for a lower-triangular `L`.
#[inline]
pub fn correlate(lower: &DMatrix<f64>, z: &[f64], out: &mut [f64]) {
    let n = lower.nrows();
    for i in 0..n {
        let mut acc = 0.0;
        for (j, zj) in z.iter().enumerate().take(i + 1) {
            acc += lower[(i, j)] * zj;
        }
        out[i] = acc;
    }
}
