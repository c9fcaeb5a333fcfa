//! Continuation-value regression.
//!
//! Ordinary least squares through an SVD pseudo-inverse. Raw inputs (state
//! components, plus the immediate value when the exercise indicator is on)
//! are centred and scaled over the fitted sample first; constant inputs
//! become zero columns and are dropped by the singular-value cut-off
//! `max(n, p) * eps * s_max`.
//!
//! A fit never fails. A degenerate degree is retried one degree lower,
//! down to a constant, and finally to the zero estimate.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::basis::RegressionBasis;

/// Why a requested basis could not be fitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegenerateRegression {
    /// Fewer sample paths than basis functions.
    TooFewPaths {
        /// Sample size
        paths: usize,
        /// Basis size
        features: usize,
    },
    /// The SVD could not produce a solution.
    Decomposition(&'static str),
    /// Coefficients or inputs were not finite.
    NonFinite,
}

impl fmt::Display for DegenerateRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPaths { paths, features } => {
                write!(f, "{paths} paths for {features} basis functions")
            }
            Self::Decomposition(msg) => write!(f, "decomposition failed: {msg}"),
            Self::NonFinite => write!(f, "non-finite regression"),
        }
    }
}

/// Fitted continuation estimator for one exercise date.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationEstimate {
    basis: RegressionBasis,
    shift: Vec<f64>,
    scale: Vec<f64>,
    coefficients: Vec<f64>,
    fallback: Option<DegenerateRegression>,
}

impl ContinuationEstimate {
    /// Estimate predicting zero continuation everywhere.
    pub fn zero(basis: RegressionBasis, reason: Option<DegenerateRegression>) -> Self {
        Self {
            basis,
            shift: Vec::new(),
            scale: Vec::new(),
            coefficients: Vec::new(),
            fallback: reason,
        }
    }

    /// Predicted continuation for `state` with immediate exercise value
    /// `immediate`.
    ///
    /// Pure and defined for every finite input, including values outside
    /// the fitted range.
    pub fn predict(&self, state: &[f64], immediate: f64) -> f64 {
        let extra = self.basis.exercise_indicator().then_some(immediate);
        let inputs = state
            .iter()
            .copied()
            .chain(extra)
            .zip(self.shift.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s);
        self.basis.combine(inputs, &self.coefficients)
    }

    /// Basis actually fitted (degree may be below the requested one).
    pub fn basis(&self) -> &RegressionBasis {
        &self.basis
    }

    /// Fitted coefficients; empty for the zero estimate.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// First reason a higher degree was abandoned, if any.
    pub fn fallback(&self) -> Option<&DegenerateRegression> {
        self.fallback.as_ref()
    }

    /// Whether this is the zero-continuation estimate.
    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }
}

/// Fits [`ContinuationEstimate`]s with a fixed requested basis.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::lsm::{BasisFamily, RegressionBasis, RegressionEngine};
///
/// let engine = RegressionEngine::new(RegressionBasis::new(BasisFamily::Monomial, 1));
/// let xs = [[0.0], [1.0], [2.0], [3.0]];
/// let states: Vec<&[f64]> = xs.iter().map(|x| &x[..]).collect();
/// let immediate = [1.0; 4];
/// let targets = [1.0, 3.0, 5.0, 7.0];
///
/// let fit = engine.fit(&states, &immediate, &targets);
/// assert!(fit.fallback().is_none());
/// assert!((fit.predict(&[10.0], 1.0) - 21.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegressionEngine {
    basis: RegressionBasis,
}

impl RegressionEngine {
    /// Engine with requested `basis`.
    pub fn new(basis: RegressionBasis) -> Self {
        Self { basis }
    }

    /// Requested basis.
    pub fn basis(&self) -> &RegressionBasis {
        &self.basis
    }

    /// Regress `targets` on the basis of `(states, immediates)`.
    ///
    /// All three slices have one entry per sample path.
    pub fn fit(
        &self,
        states: &[&[f64]],
        immediates: &[f64],
        targets: &[f64],
    ) -> ContinuationEstimate {
        let n = targets.len();
        let Some(state_dim) = states.first().map(|s| s.len()) else {
            return ContinuationEstimate::zero(
                self.basis,
                Some(DegenerateRegression::TooFewPaths {
                    paths: 0,
                    features: 1,
                }),
            );
        };

        if targets.iter().chain(immediates).any(|x| !x.is_finite()) {
            return self.give_up(DegenerateRegression::NonFinite);
        }

        let k = self.basis.input_dim(state_dim);
        let mut raw = vec![0.0; n * k];
        for (i, state) in states.iter().enumerate() {
            let row = &mut raw[i * k..(i + 1) * k];
            row[..state_dim].copy_from_slice(state);
            if self.basis.exercise_indicator() {
                row[state_dim] = immediates[i];
            }
        }
        let (shift, scale) = standardise(&mut raw, n, k);

        let mut first_reason = None;
        let mut basis = self.basis;
        loop {
            if basis.degree() == 0 {
                break;
            }
            match solve(&basis, &raw, n, k, targets) {
                Ok(coefficients) => {
                    return self.finish(basis, shift, scale, coefficients, first_reason);
                }
                Err(reason) => {
                    debug!(
                        degree = basis.degree(),
                        paths = n,
                        %reason,
                        "degenerate regression, lowering degree"
                    );
                    first_reason.get_or_insert(reason);
                }
            }
            match basis.lower() {
                Some(lower) => basis = lower,
                None => break,
            }
        }

        let mean = targets.iter().sum::<f64>() / n as f64;
        if !mean.is_finite() {
            return self.give_up(first_reason.unwrap_or(DegenerateRegression::NonFinite));
        }
        self.finish(basis, shift, scale, vec![mean], first_reason)
    }

    fn finish(
        &self,
        basis: RegressionBasis,
        shift: Vec<f64>,
        scale: Vec<f64>,
        coefficients: Vec<f64>,
        fallback: Option<DegenerateRegression>,
    ) -> ContinuationEstimate {
        ContinuationEstimate {
            basis,
            shift,
            scale,
            coefficients,
            fallback,
        }
    }

    fn give_up(&self, reason: DegenerateRegression) -> ContinuationEstimate {
        debug!(%reason, "regression abandoned, using zero continuation");
        ContinuationEstimate::zero(self.basis, Some(reason))
    }
}

/// Centre and scale each of the `k` columns of row-major `raw` in place.
fn standardise(raw: &mut [f64], n: usize, k: usize) -> (Vec<f64>, Vec<f64>) {
    let mut shift = vec![0.0; k];
    let mut scale = vec![1.0; k];
    for j in 0..k {
        let mean = (0..n).map(|i| raw[i * k + j]).sum::<f64>() / n as f64;
        let var = (0..n).map(|i| (raw[i * k + j] - mean).powi(2)).sum::<f64>() / n as f64;
        let sd = var.sqrt();
        shift[j] = mean;
        if sd > 1e-12 * mean.abs().max(1e-12) && sd.is_finite() {
            scale[j] = sd;
        }
        for i in 0..n {
            raw[i * k + j] = (raw[i * k + j] - shift[j]) / scale[j];
        }
    }
    (shift, scale)
}

/// Least squares at one degree.
fn solve(
    basis: &RegressionBasis,
    inputs: &[f64],
    n: usize,
    k: usize,
    targets: &[f64],
) -> Result<Vec<f64>, DegenerateRegression> {
    let p = 1 + basis.degree() * k;
    if n < p {
        return Err(DegenerateRegression::TooFewPaths {
            paths: n,
            features: p,
        });
    }

    let mut design = vec![0.0; n * p];
    for i in 0..n {
        basis.evaluate(&inputs[i * k..(i + 1) * k], &mut design[i * p..(i + 1) * p]);
    }
    let x = DMatrix::from_row_slice(n, p, &design);
    let y = DVector::from_column_slice(targets);

    let svd = x.svd(true, true);
    let s_max = svd.singular_values.max();
    if !(s_max > 0.0) || !s_max.is_finite() {
        return Err(DegenerateRegression::NonFinite);
    }
    let eps = n.max(p) as f64 * f64::EPSILON * s_max;
    let beta = svd
        .solve(&y, eps)
        .map_err(DegenerateRegression::Decomposition)?;
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(DegenerateRegression::NonFinite);
    }
    Ok(beta.iter().copied().collect())
}
