//! Regression basis functions.
//!
//! A basis maps a vector of standardised inputs `u` to a feature row:
//!
//! ```text
//! [1, f_1(u_0), ..., f_d(u_0), f_1(u_1), ..., f_d(u_k)]
//! ```
//!
//! where `f_p` is `u^p` (monomial) or the Laguerre polynomial `L_p(u)`.
//! Cross terms are omitted so the basis size grows linearly with the state
//! dimension. With the exercise indicator on, the immediate exercise value
//! is appended to the inputs and expanded the same way.

use serde::{Deserialize, Serialize};

/// Polynomial family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisFamily {
    /// `u, u^2, u^3`
    #[default]
    Monomial,
    /// `L_1(u), L_2(u), L_3(u)`
    Laguerre,
}

/// Highest supported degree.
pub const MAX_DEGREE: usize = 3;

/// Stateless feature map.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::lsm::{BasisFamily, RegressionBasis};
///
/// let basis = RegressionBasis::new(BasisFamily::Monomial, 2);
/// let mut row = vec![0.0; basis.size(1)];
/// basis.evaluate(&[3.0], &mut row);
/// assert_eq!(row, vec![1.0, 3.0, 9.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegressionBasis {
    family: BasisFamily,
    degree: usize,
    exercise_indicator: bool,
}

impl RegressionBasis {
    /// Basis of `family` up to `degree` (clamped to [`MAX_DEGREE`]).
    pub fn new(family: BasisFamily, degree: usize) -> Self {
        Self {
            family,
            degree: degree.min(MAX_DEGREE),
            exercise_indicator: false,
        }
    }

    /// Include the immediate exercise value as an input.
    pub fn with_exercise_indicator(mut self, on: bool) -> Self {
        self.exercise_indicator = on;
        self
    }

    /// Polynomial family.
    pub fn family(&self) -> BasisFamily {
        self.family
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Whether the immediate exercise value is an input.
    pub fn exercise_indicator(&self) -> bool {
        self.exercise_indicator
    }

    /// Same basis one degree lower, or `None` at degree 0.
    pub fn lower(&self) -> Option<Self> {
        self.degree.checked_sub(1).map(|degree| Self { degree, ..*self })
    }

    /// Number of raw inputs for a state of length `state_dim`.
    pub fn input_dim(&self, state_dim: usize) -> usize {
        state_dim + usize::from(self.exercise_indicator)
    }

    /// Feature count for a state of length `state_dim`.
    pub fn size(&self, state_dim: usize) -> usize {
        1 + self.degree * self.input_dim(state_dim)
    }

    /// Writes the feature row for standardised `inputs` into `out`.
    ///
    /// `out.len()` must equal `1 + degree * inputs.len()`.
    pub fn evaluate(&self, inputs: &[f64], out: &mut [f64]) {
        out[0] = 1.0;
        let d = self.degree;
        for (k, &u) in inputs.iter().enumerate() {
            for p in 1..=d {
                out[k * d + p] = term(self.family, p, u);
            }
        }
    }

    /// `coefficients . features(inputs)` without materialising the row.
    ///
    /// An empty coefficient vector combines to zero.
    pub fn combine<I>(&self, inputs: I, coefficients: &[f64]) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let Some((&intercept, slopes)) = coefficients.split_first() else {
            return 0.0;
        };
        let d = self.degree;
        inputs
            .into_iter()
            .enumerate()
            .fold(intercept, |acc, (k, u)| {
                acc + (1..=d)
                    .map(|p| slopes[k * d + p - 1] * term(self.family, p, u))
                    .sum::<f64>()
            })
    }
}

/// Basis function of order `p` in `family`.
#[inline]
fn term(family: BasisFamily, p: usize, u: f64) -> f64 {
    match family {
        BasisFamily::Monomial => u.powi(p as i32),
        BasisFamily::Laguerre => laguerre(p, u),
    }
}

/// Laguerre polynomial `L_n(x)` for `n <= 3`.
#[inline]
fn laguerre(n: usize, x: f64) -> f64 {
    match n {
        0 => 1.0,
        1 => 1.0 - x,
        2 => 0.5 * (x * x - 4.0 * x + 2.0),
        _ => (-x * x * x + 9.0 * x * x - 18.0 * x + 6.0) / 6.0,
    }
}
