//! Term-structure models for Monte Carlo simulation.
//!
//! - [`RateDynamics`]: single-step contract every model implements
//! - [`RateModel`]: closed enum over the supported models
//! - [`ModelSpec`]: serialisable description built against market data
//! - [`rates`]: Hull-White 1F, LMM and SABR-LMM
//! - [`correlation`]: correlation specs and Cholesky factors
//!
//! ## Example
//!
//! ```
//! use pricer_core::market_data::MarketSnapshot;
//! use pricer_models::models::{ModelSpec, Scheme, SigmaSource};
//!
//! let market = MarketSnapshot::flat(0.02, 0.2).unwrap();
//! let model = ModelSpec::HullWhite {
//!     mean_reversion: 0.03,
//!     sigma: SigmaSource::Fixed { value: 0.008 },
//!     curve_horizon: 30.0,
//! }
//! .build(&market)
//! .unwrap();
//!
//! let mut state = vec![0.0; model.state_dim()];
//! model.initial_state(&mut state);
//! let mut next = vec![0.0; model.state_dim()];
//! let normals = vec![0.0; model.brownian_dim(Scheme::Exact)];
//! let n1 = model.evolve(0.0, 1.0, &state, 1.0, &normals, Scheme::Exact, &mut next);
//! assert!(n1 > 1.0);
//! ```

pub mod correlation;
pub mod error;
pub mod model_enum;
pub mod rates;
pub mod spec;
pub mod stochastic;

pub use correlation::CorrelationSpec;
pub use error::ModelError;
pub use model_enum::RateModel;
pub use spec::{ModelParameter, ModelSpec, SigmaSource};
pub use stochastic::{RateDynamics, Scheme};
