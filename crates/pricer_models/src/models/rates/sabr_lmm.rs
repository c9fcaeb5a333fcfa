//! SABR-LMM: CEV forwards driven by one shared stochastic volatility factor.
//!
//! ```text
//! dL_i = mu_i dt + V sigma_i L_i^beta dW_i
//! dV   = nu V dZ,                 V(0) = 1
//! d<W_i, W_j> = rho_ij dt,        d<W_i, Z> = rho_sv dt
//! ```
//!
//! Simulated under the spot measure with drift
//! `mu_i = V^2 sigma_i L_i^beta * sum_{j=beta(t)}^{i} tau_j rho_ij sigma_j L_j^beta / (1 + tau_j L_j)`.
//!
//! The state is `[L_0, ..., L_{n-1}, V]`. `V` is sampled exactly; forwards
//! use an absorbing Euler step floored at [`FORWARD_FLOOR`] under both
//! schemes.

use nalgebra::DMatrix;
use pricer_core::market_data::MarketDataProvider;

use super::lmm::{check_vols, initial_forwards, VolSource};
use super::tenor::TenorStructure;
use crate::models::correlation::{cholesky_lower, correlate, CorrelationSpec};
use crate::models::error::ModelError;
use crate::models::stochastic::{RateDynamics, Scheme};

/// Lower bound applied to simulated forwards.
pub const FORWARD_FLOOR: f64 = 1e-12;

/// Stochastic-volatility parameters shared by all forwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SabrParams {
    /// CEV exponent in `(0, 1]`.
    pub beta: f64,
    /// Volatility of the volatility factor (>= 0).
    pub vol_of_vol: f64,
    /// Correlation between forwards and the volatility factor.
    pub rho_sv: f64,
}

impl SabrParams {
    fn validate(&self) -> Result<(), ModelError> {
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(ModelError::InvalidParameter {
                name: "beta",
                value: self.beta,
            });
        }
        if !(self.vol_of_vol >= 0.0) || !self.vol_of_vol.is_finite() {
            return Err(ModelError::InvalidParameter {
                name: "vol_of_vol",
                value: self.vol_of_vol,
            });
        }
        if !(self.rho_sv.abs() <= 1.0) {
            return Err(ModelError::InvalidParameter {
                name: "rho_sv",
                value: self.rho_sv,
            });
        }
        Ok(())
    }
}

/// SABR-LMM model.
#[derive(Debug, Clone, PartialEq)]
pub struct SabrLmm {
    tenor: TenorStructure,
    forwards: Vec<f64>,
    vols: Vec<f64>,
    params: SabrParams,
    correlation: DMatrix<f64>,
    chol: DMatrix<f64>,
}

impl SabrLmm {
    /// Create a model from explicit CEV volatilities.
    ///
    /// The joint `(n + 1) x (n + 1)` correlation of forwards and volatility
    /// must be positive definite.
    pub fn new(
        tenor: TenorStructure,
        forwards: Vec<f64>,
        vols: Vec<f64>,
        params: SabrParams,
        correlation: &CorrelationSpec,
    ) -> Result<Self, ModelError> {
        params.validate()?;
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

        let rho_f = correlation.matrix(tenor.resets())?;
        let full = DMatrix::from_fn(n + 1, n + 1, |i, j| match (i == n, j == n) {
            (true, true) => 1.0,
            (true, false) | (false, true) => params.rho_sv,
            (false, false) => rho_f[(i, j)],
        });
        let chol = cholesky_lower(full)?;

        Ok(Self {
            tenor,
            forwards,
            vols,
            params,
            correlation: rho_f,
            chol,
        })
    }

    /// Build from a market provider.
    ///
    /// Market quotes are lognormal; they are mapped to CEV volatilities with
    /// `sigma_i = sigma_black * L_i^(1 - beta)`. Flat and fixed sources are
    /// taken as CEV volatilities directly.
    pub fn from_market(
        market: &dyn MarketDataProvider,
        tenor: TenorStructure,
        vols: &VolSource,
        params: SabrParams,
        correlation: &CorrelationSpec,
    ) -> Result<Self, ModelError> {
        let forwards = initial_forwards(market, &tenor)?;
        let mut sigmas = vols.resolve(market, &tenor)?;
        if matches!(vols, VolSource::Market) {
            for (s, &f) in sigmas.iter_mut().zip(&forwards) {
                *s *= f.max(FORWARD_FLOOR).powf(1.0 - params.beta);
            }
        }
        Self::new(tenor, forwards, sigmas, params, correlation)
    }

    /// Tenor structure.
    pub fn tenor(&self) -> &TenorStructure {
        &self.tenor
    }

    /// Stochastic-volatility parameters.
    pub fn params(&self) -> SabrParams {
        self.params
    }

    /// CEV volatilities.
    pub fn vols(&self) -> &[f64] {
        &self.vols
    }

    /// Initial forwards.
    pub fn initial_forwards(&self) -> &[f64] {
        &self.forwards
    }
}

impl RateDynamics for SabrLmm {
    fn model_name(&self) -> &'static str {
        "SABR-LMM"
    }

    fn state_dim(&self) -> usize {
        self.tenor.n_forwards() + 1
    }

    fn brownian_dim(&self, _scheme: Scheme) -> usize {
        self.tenor.n_forwards() + 1
    }

    fn horizon(&self) -> f64 {
        self.tenor.end()
    }

    fn initial_state(&self, out: &mut [f64]) {
        let n = self.tenor.n_forwards();
        out[..n].copy_from_slice(&self.forwards);
        out[n] = 1.0;
    }

    fn initial_numeraire(&self) -> f64 {
        self.tenor.spot_numeraire(0.0, &self.forwards)
    }

    /// Correlated shocks, local vols and drift weights.
    fn scratch_len(&self) -> usize {
        3 * self.tenor.n_forwards() + 1
    }

    fn evolve_with_scratch(
        &self,
        t0: f64,
        t1: f64,
        state: &[f64],
        _numeraire: f64,
        normals: &[f64],
        _scheme: Scheme,
        next: &mut [f64],
        scratch: &mut [f64],
    ) -> f64 {
        let n = self.tenor.n_forwards();
        let beta = self.params.beta;
        let nu = self.params.vol_of_vol;
        next[..=n].copy_from_slice(&state[..=n]);

        let (w, rest) = scratch[..3 * n + 1].split_at_mut(n + 1);
        let (local, weights) = rest.split_at_mut(n);
        correlate(&self.chol, &normals[..=n], w);

        let v = state[n];
        let live = self.tenor.first_live(t0);
        if live < n {
            for j in 0..n {
                local[j] = self.vols[j] * state[j].max(FORWARD_FLOOR).powf(beta);
                let tau = self.tenor.accrual(j);
                weights[j] = tau * local[j] / (1.0 + tau * state[j]);
            }
            for i in live..n {
                let sum: f64 = (live..=i)
                    .map(|j| self.correlation[(i, j)] * weights[j])
                    .sum();
                let mu = v * v * local[i] * sum;
                let dt = self.tenor.reset(i).min(t1) - t0;
                let step = state[i] + mu * dt + v * local[i] * dt.sqrt() * w[i];
                next[i] = step.max(FORWARD_FLOOR);
            }
        }

        let dt = t1 - t0;
        next[n] = v * (-0.5 * nu * nu * dt + nu * dt.sqrt() * w[n]).exp();

        self.tenor.spot_numeraire(t1, &next[..n])
    }

    fn zero_bond(&self, t: f64, maturity: f64, state: &[f64]) -> f64 {
        self.tenor.bond(t, maturity, &state[..self.tenor.n_forwards()])
    }

    fn initial_zero_bond(&self, maturity: f64) -> f64 {
        self.tenor.bond(0.0, maturity, &self.forwards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::MarketSnapshot;

    fn params() -> SabrParams {
        SabrParams {
            beta: 0.5,
            vol_of_vol: 0.3,
            rho_sv: -0.3,
        }
    }

    fn model() -> SabrLmm {
        let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
        SabrLmm::from_market(
            &market,
            TenorStructure::uniform(2.0, 0.5).unwrap(),
            &VolSource::Market,
            params(),
            &CorrelationSpec::Exponential { decay: 0.1 },
        )
        .unwrap()
    }

    #[test]
    fn test_state_layout() {
        let m = model();
        assert_eq!(m.state_dim(), 5);
        assert_eq!(m.brownian_dim(Scheme::Exact), 5);
        let mut s = vec![0.0; 5];
        m.initial_state(&mut s);
        assert_eq!(s[4], 1.0);
        assert_relative_eq!(m.initial_numeraire(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_cev_vol_mapping() {
        let m = model();
        let f = m.initial_forwards()[1];
        assert_relative_eq!(m.vols()[1], 0.2 * f.powf(0.5), epsilon = 1e-14);
    }

    #[test]
    fn test_vol_factor_moves_with_its_shock() {
        let m = model();
        let mut s = vec![0.0; 5];
        m.initial_state(&mut s);
        let mut up = vec![0.0; 5];
        let mut down = vec![0.0; 5];
        let mut z = vec![0.0; 5];
        z[4] = 1.0;
        m.evolve(0.0, 0.25, &s, 1.0, &z, Scheme::Euler, &mut up);
        z[4] = -1.0;
        m.evolve(0.0, 0.25, &s, 1.0, &z, Scheme::Euler, &mut down);
        assert!(up[4] > 1.0 && down[4] < 1.0);
    }

    #[test]
    fn test_reused_scratch_matches_fresh_step() {
        let m = model();
        let mut s = vec![0.0; 5];
        m.initial_state(&mut s);
        let z = [0.4, -1.1, 0.2, 0.9, -0.5];
        let mut scratch = vec![f64::NAN; m.scratch_len()];
        let mut fresh = vec![0.0; 5];
        let mut reused = vec![0.0; 5];
        let n_fresh = m.evolve(0.0, 0.25, &s, 1.0, &z, Scheme::Euler, &mut fresh);
        let n_reused =
            m.evolve_with_scratch(0.0, 0.25, &s, 1.0, &z, Scheme::Euler, &mut reused, &mut scratch);
        assert_eq!(n_fresh.to_bits(), n_reused.to_bits());
        assert_eq!(fresh, reused);
    }

    #[test]
    fn test_forwards_stay_above_floor() {
        let m = model();
        let mut s = vec![0.0; 5];
        m.initial_state(&mut s);
        let mut next = vec![0.0; 5];
        let z = vec![-50.0; 5];
        let n = m.evolve(0.0, 0.5, &s, 1.0, &z, Scheme::Euler, &mut next);
        assert!(next[..4].iter().all(|&f| f >= FORWARD_FLOOR));
        assert!(n > 0.0 && n.is_finite());
    }

    #[test]
    fn test_rejects_non_positive_definite_joint_correlation() {
        let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
        let err = SabrLmm::from_market(
            &market,
            TenorStructure::uniform(2.0, 0.5).unwrap(),
            &VolSource::Market,
            SabrParams {
                rho_sv: -0.99,
                ..params()
            },
            &CorrelationSpec::Exponential { decay: 2.0 },
        )
        .unwrap_err();
        assert_eq!(err, ModelError::CorrelationNotPositiveDefinite);
    }

    #[test]
    fn test_rejects_bad_beta() {
        let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
        let err = SabrLmm::from_market(
            &market,
            TenorStructure::uniform(2.0, 0.5).unwrap(),
            &VolSource::Market,
            SabrParams {
                beta: 1.5,
                ..params()
            },
            &CorrelationSpec::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { name: "beta", .. }));
    }
}
