//! Monte Carlo path simulation for term-structure models.
//!
//! # Architecture
//!
//! ```text
//! PathSimulator
//! ├── EngineConfig   (scheme, antithetic, control variate, block size)
//! ├── TimeGrid       (validated simulation times)
//! ├── SubstreamRng   (one substream per path or antithetic pair)
//! └── PathEnsemble   (flat state / numeraire buffers, control sample)
//! ```
//!
//! Generation runs in parallel over path blocks. Each path's draws depend
//! only on `(seed, path index)`, never on scheduling. After each path is
//! written its states and numeraires are checked; the first non-finite
//! state or non-positive numeraire aborts the call with
//! [`SimulationError::NumericalFault`].
//!
//! # Examples
//!
//! ```rust
//! use pricer_core::market_data::MarketSnapshot;
//! use pricer_models::models::{ModelSpec, Scheme, SigmaSource};
//! use pricer_pricing::mc::{SimulateRates, TimeGrid};
//!
//! let market = MarketSnapshot::flat(0.02, 0.2).unwrap();
//! let model = ModelSpec::HullWhite {
//!     mean_reversion: 0.03,
//!     sigma: SigmaSource::Fixed { value: 0.008 },
//!     curve_horizon: 10.0,
//! }
//! .build(&market)
//! .unwrap();
//!
//! let grid = TimeGrid::refined(5.0, 12, &[]).unwrap();
//! let ensemble = model.simulate(&grid, 500, 42, Scheme::Exact).unwrap();
//! assert_eq!(ensemble.grid().len(), 61);
//! ```

mod config;
mod ensemble;
mod error;
mod grid;
mod simulator;

pub use config::{
    EngineConfig, EngineConfigBuilder, DEFAULT_BLOCK_SIZE, DEFAULT_PATH_COUNT,
    DEFAULT_REGRESSION_DEGREE, DEFAULT_SEED, DEFAULT_STEPS_PER_YEAR, DEFAULT_TOLERANCE, MAX_PATHS,
};
pub use ensemble::{ControlSample, PathEnsemble};
pub use error::{ConfigError, SimulationError};
pub use grid::TimeGrid;
pub use simulator::{PathSimulator, SimulateRates};
