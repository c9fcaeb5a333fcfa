//! Lognormal LIBOR market model.
//!
//! Forward rates `L_i` on a [`TenorStructure`] follow
//!
//! ```text
//! dL_i / L_i = mu_i(t) dt + sigma_i dW_i,   d<W_i, W_j> = rho_ij dt
//! ```
//!
//! with the drift set by the pricing measure:
//!
//! - **Spot**: `mu_i = sigma_i * sum_{j=beta(t)}^{i} tau_j rho_ij sigma_j L_j / (1 + tau_j L_j)`,
//!   numeraire = discretely rebalanced bank account.
//! - **Terminal** (`T_n`): `mu_i = -sigma_i * sum_{j=i+1}^{n-1} tau_j rho_ij sigma_j L_j / (1 + tau_j L_j)`,
//!   numeraire = `P(t, T_n)`.
//!
//! A forward stops evolving at its reset date and its fixing stays in the
//! state, which is what the numeraire and bond prices read afterwards.
//!
//! There is no closed-form transition. [`Scheme::Euler`] is log-Euler with
//! the drift frozen at the start of the step; [`Scheme::Exact`] maps to the
//! predictor-corrector variant that averages start and predicted drifts.

use nalgebra::DMatrix;
use pricer_core::market_data::MarketDataProvider;
use serde::{Deserialize, Serialize};

use super::tenor::TenorStructure;
use crate::models::correlation::{cholesky_lower, correlate, CorrelationSpec};
use crate::models::error::ModelError;
use crate::models::stochastic::{RateDynamics, Scheme};

/// Pricing measure of the forward-rate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmmMeasure {
    /// Rolling spot measure.
    #[default]
    Spot,
    /// Terminal forward measure of the last tenor date.
    Terminal,
}

/// Where forward volatilities come from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VolSource {
    /// Swaption grid quote at (reset, accrual) for each forward.
    #[default]
    Market,
    /// One volatility for every forward.
    Flat {
        /// Volatility
        value: f64,
    },
    /// One volatility per forward.
    Fixed {
        /// Volatilities, one per forward
        values: Vec<f64>,
    },
}

impl VolSource {
    /// Resolve to one volatility per forward.
    pub fn resolve(
        &self,
        market: &dyn MarketDataProvider,
        tenor: &TenorStructure,
    ) -> Result<Vec<f64>, ModelError> {
        let n = tenor.n_forwards();
        let vols = match self {
            VolSource::Market => (0..n)
                .map(|i| market.volatility(tenor.reset(i), tenor.accrual(i)))
                .collect::<Result<Vec<_>, _>>()?,
            VolSource::Flat { value } => vec![*value; n],
            VolSource::Fixed { values } => {
                if values.len() != n {
                    return Err(ModelError::DimensionMismatch {
                        what: "forward volatilities",
                        expected: n,
                        got: values.len(),
                    });
                }
                values.clone()
            }
        };
        Ok(vols)
    }

    /// Copy with every volatility passed through `f`.
    ///
    /// Returns `None` for [`VolSource::Market`], whose levels live in the
    /// market snapshot.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Option<Self> {
        match self {
            VolSource::Market => None,
            VolSource::Flat { value } => Some(VolSource::Flat { value: f(*value) }),
            VolSource::Fixed { values } => Some(VolSource::Fixed {
                values: values.iter().map(|&v| f(v)).collect(),
            }),
        }
    }
}

/// Initial forwards `L_i(0)` implied by the provider's curve.
pub fn initial_forwards(
    market: &dyn MarketDataProvider,
    tenor: &TenorStructure,
) -> Result<Vec<f64>, ModelError> {
    let d = tenor.dates();
    (0..tenor.n_forwards())
        .map(|i| market.forward_rate(d[i], d[i + 1]).map_err(ModelError::from))
        .collect()
}

pub(crate) fn check_vols(vols: &[f64], n: usize) -> Result<(), ModelError> {
    if vols.len() != n {
        return Err(ModelError::DimensionMismatch {
            what: "forward volatilities",
            expected: n,
            got: vols.len(),
        });
    }
    if let Some(&v) = vols.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(ModelError::InvalidVolatility(v));
    }
    Ok(())
}

/// Lognormal LMM with full-rank correlated drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct LiborMarketModel {
    tenor: TenorStructure,
    forwards: Vec<f64>,
    vols: Vec<f64>,
    correlation: DMatrix<f64>,
    chol: DMatrix<f64>,
    measure: LmmMeasure,
}

impl LiborMarketModel {
    /// Create a model from explicit inputs.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` when forwards or vols do not match the tenor
    /// - `InvalidParameter` for a non-positive initial forward
    /// - `InvalidVolatility` for a negative volatility
    /// - correlation errors from [`CorrelationSpec::matrix`] and Cholesky
    pub fn new(
        tenor: TenorStructure,
        forwards: Vec<f64>,
        vols: Vec<f64>,
        correlation: &CorrelationSpec,
        measure: LmmMeasure,
    ) -> Result<Self, ModelError> {
        let n = tenor.n_forwards();
        if forwards.len() != n {
            return Err(ModelError::DimensionMismatch {
                what: "initial forwards",
                expected: n,
                got: forwards.len(),
            });
        }
        if let Some(&f) = forwards.iter().find(|f| !(**f > 0.0) || !f.is_finite()) {
            return Err(ModelError::InvalidParameter {
                name: "initial forward",
                value: f,
            });
        }
        check_vols(&vols, n)?;
        let correlation = correlation.matrix(tenor.resets())?;
        let chol = cholesky_lower(correlation.clone())?;
        Ok(Self {
            tenor,
            forwards,
            vols,
            correlation,
            chol,
            measure,
        })
    }

    /// Build from a market provider: forwards from discount factors, vols
    /// from `vols`.
    pub fn from_market(
        market: &dyn MarketDataProvider,
        tenor: TenorStructure,
        vols: &VolSource,
        correlation: &CorrelationSpec,
        measure: LmmMeasure,
    ) -> Result<Self, ModelError> {
        let forwards = initial_forwards(market, &tenor)?;
        let sigmas = vols.resolve(market, &tenor)?;
        Self::new(tenor, forwards, sigmas, correlation, measure)
    }

    /// Tenor structure.
    pub fn tenor(&self) -> &TenorStructure {
        &self.tenor
    }

    /// Initial forwards.
    pub fn initial_forwards(&self) -> &[f64] {
        &self.forwards
    }

    /// Forward volatilities.
    pub fn vols(&self) -> &[f64] {
        &self.vols
    }

    /// Pricing measure.
    pub fn measure(&self) -> LmmMeasure {
        self.measure
    }

    /// Instantaneous drifts of the live forwards (`i >= first_live`).
    fn drift(&self, first_live: usize, forwards: &[f64], out: &mut [f64]) {
        let n = forwards.len();
        let weight = |j: usize| {
            let tau = self.tenor.accrual(j);
            tau * self.vols[j] * forwards[j] / (1.0 + tau * forwards[j])
        };
        for i in first_live..n {
            let range = match self.measure {
                LmmMeasure::Spot => first_live..i + 1,
                LmmMeasure::Terminal => i + 1..n,
            };
            let sum: f64 = range.map(|j| self.correlation[(i, j)] * weight(j)).sum();
            out[i] = match self.measure {
                LmmMeasure::Spot => self.vols[i] * sum,
                LmmMeasure::Terminal => -self.vols[i] * sum,
            };
        }
    }

    fn numeraire(&self, t: f64, forwards: &[f64]) -> f64 {
        match self.measure {
            LmmMeasure::Spot => self.tenor.spot_numeraire(t, forwards),
            LmmMeasure::Terminal => self.tenor.terminal_numeraire(t, forwards),
        }
    }
}

impl RateDynamics for LiborMarketModel {
    fn model_name(&self) -> &'static str {
        "LMM"
    }

    fn state_dim(&self) -> usize {
        self.tenor.n_forwards()
    }

    fn brownian_dim(&self, _scheme: Scheme) -> usize {
        self.tenor.n_forwards()
    }

    fn horizon(&self) -> f64 {
        self.tenor.end()
    }

    fn initial_state(&self, out: &mut [f64]) {
        out.copy_from_slice(&self.forwards);
    }

    fn initial_numeraire(&self) -> f64 {
        self.numeraire(0.0, &self.forwards)
    }

    /// Correlated shocks plus predictor and corrector drifts.
    fn scratch_len(&self) -> usize {
        3 * self.tenor.n_forwards()
    }

    fn evolve_with_scratch(
        &self,
        t0: f64,
        t1: f64,
        state: &[f64],
        _numeraire: f64,
        normals: &[f64],
        scheme: Scheme,
        next: &mut [f64],
        scratch: &mut [f64],
    ) -> f64 {
        let n = self.tenor.n_forwards();
        next[..n].copy_from_slice(&state[..n]);

        let live = self.tenor.first_live(t0);
        if live < n {
            let (w, rest) = scratch[..3 * n].split_at_mut(n);
            let (mu0, mu1) = rest.split_at_mut(n);
            correlate(&self.chol, &normals[..n], w);
            self.drift(live, state, mu0);

            for i in live..n {
                let dt = self.tenor.reset(i).min(t1) - t0;
                let s = self.vols[i];
                next[i] = state[i] * ((mu0[i] - 0.5 * s * s) * dt + s * dt.sqrt() * w[i]).exp();
            }

            if scheme == Scheme::Exact {
                self.drift(live, next, mu1);
                for i in live..n {
                    let dt = self.tenor.reset(i).min(t1) - t0;
                    let s = self.vols[i];
                    let mu = 0.5 * (mu0[i] + mu1[i]);
                    next[i] = state[i] * ((mu - 0.5 * s * s) * dt + s * dt.sqrt() * w[i]).exp();
                }
            }
        }

        self.numeraire(t1, next)
    }

    fn zero_bond(&self, t: f64, maturity: f64, state: &[f64]) -> f64 {
        self.tenor.bond(t, maturity, state)
    }

    fn initial_zero_bond(&self, maturity: f64) -> f64 {
        self.tenor.bond(0.0, maturity, &self.forwards)
    }
}
