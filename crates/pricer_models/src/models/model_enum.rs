//! Closed set of rate models behind one simulation interface.
//!
//! [`RateModel`] dispatches with `match` over its variants. The simulator,
//! payoffs and the pricer only ever see `RateModel`, so adding a model means
//! adding a variant here and nothing else.
//!
//! ## Example
//!
//! ```
//! use pricer_core::market_data::MarketSnapshot;
//! use pricer_models::models::{RateModel, Scheme};
//! use pricer_models::models::rates::HullWhite1F;
//!
//! let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
//! let model: RateModel = HullWhite1F::from_market(&market, 0.05, 0.01, 30.0).unwrap().into();
//!
//! assert_eq!(model.model_name(), "HullWhite1F");
//! assert_eq!(model.state_dim(), 1);
//! assert_eq!(model.brownian_dim(Scheme::Exact), 2);
//! ```

use super::rates::{HullWhite1F, LiborMarketModel, SabrLmm};
use super::stochastic::{RateDynamics, Scheme};

/// Term-structure model used for simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum RateModel {
    /// Hull-White one-factor short rate.
    HullWhite1F(HullWhite1F),
    /// Lognormal LIBOR market model.
    Lmm(LiborMarketModel),
    /// SABR LIBOR market model.
    SabrLmm(SabrLmm),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            RateModel::HullWhite1F($m) => $body,
            RateModel::Lmm($m) => $body,
            RateModel::SabrLmm($m) => $body,
        }
    };
}

impl RateModel {
    /// Short display name.
    pub fn model_name(&self) -> &'static str {
        dispatch!(self, m => m.model_name())
    }

    /// Number of state variables per path and time.
    pub fn state_dim(&self) -> usize {
        dispatch!(self, m => m.state_dim())
    }

    /// Number of standard normals consumed per step.
    pub fn brownian_dim(&self, scheme: Scheme) -> usize {
        dispatch!(self, m => m.brownian_dim(scheme))
    }

    /// Last time the model can be simulated to.
    pub fn horizon(&self) -> f64 {
        dispatch!(self, m => m.horizon())
    }

    /// Write the state at t = 0 into `out`.
    pub fn initial_state(&self, out: &mut [f64]) {
        dispatch!(self, m => m.initial_state(out))
    }

    /// Numeraire at t = 0.
    pub fn initial_numeraire(&self) -> f64 {
        dispatch!(self, m => m.initial_numeraire())
    }

    /// Advance one path from `t0` to `t1`; returns N(t1).
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn evolve(
        &self,
        t0: f64,
        t1: f64,
        state: &[f64],
        numeraire: f64,
        normals: &[f64],
        scheme: Scheme,
        next: &mut [f64],
    ) -> f64 {
        dispatch!(self, m => m.evolve(t0, t1, state, numeraire, normals, scheme, next))
    }

    /// Work buffer length for [`evolve_with_scratch`](Self::evolve_with_scratch).
    pub fn scratch_len(&self) -> usize {
        dispatch!(self, m => m.scratch_len())
    }

    /// [`evolve`](Self::evolve) with a caller-owned work buffer.
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn evolve_with_scratch(
        &self,
        t0: f64,
        t1: f64,
        state: &[f64],
        numeraire: f64,
        normals: &[f64],
        scheme: Scheme,
        next: &mut [f64],
        scratch: &mut [f64],
    ) -> f64 {
        dispatch!(self, m => m.evolve_with_scratch(t0, t1, state, numeraire, normals, scheme, next, scratch))
    }

    /// Model bond price P(t, maturity) given the state at `t`.
    #[inline]
    pub fn zero_bond(&self, t: f64, maturity: f64, state: &[f64]) -> f64 {
        dispatch!(self, m => m.zero_bond(t, maturity, state))
    }

    /// Initial discount factor P(0, maturity).
    pub fn initial_zero_bond(&self, maturity: f64) -> f64 {
        dispatch!(self, m => m.initial_zero_bond(maturity))
    }
}

impl From<HullWhite1F> for RateModel {
    fn from(m: HullWhite1F) -> Self {
        RateModel::HullWhite1F(m)
    }
}

impl From<LiborMarketModel> for RateModel {
    fn from(m: LiborMarketModel) -> Self {
        RateModel::Lmm(m)
    }
}

impl From<SabrLmm> for RateModel {
    fn from(m: SabrLmm) -> Self {
        RateModel::SabrLmm(m)
    }
}
