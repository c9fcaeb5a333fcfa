//! # Pricer Pricing (Layer 3: Simulation and LSM Engine)
//!
//! ## Layer 3 Role
//!
//! pricer_pricing turns a [`RateModel`](pricer_models::models::RateModel)
//! and a [`Payoff`](pricer_models::instruments::Payoff) into a price:
//! - Seed-derived random substreams ([`rng`])
//! - Parallel path generation with antithetic variates and a discount-bond
//!   control sample ([`mc`])
//! - Least-Squares Monte Carlo backward induction with a soft regression
//!   fallback ([`lsm`])
//! - Bump-and-revalue sensitivities with common random numbers ([`greeks`])
//!
//! Every long-running call accepts a [`CancellationToken`], polled between
//! path blocks and between exercise dates.
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_core::market_data::MarketSnapshot;
//! use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
//! use pricer_models::models::{ModelSpec, SigmaSource};
//! use pricer_pricing::lsm::{ExerciseSchedule, LsmPricer};
//! use pricer_pricing::mc::EngineConfig;
//!
//! let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
//! let model = ModelSpec::HullWhite {
//!     mean_reversion: 0.05,
//!     sigma: SigmaSource::Fixed { value: 0.01 },
//!     curve_horizon: 10.0,
//! }
//! .build(&market)
//! .unwrap();
//!
//! let swaption =
//!     BermudanSwaption::coterminal(SwaptionType::Receiver, 1.0, 0.03, 1.0, 5.0, 1.0).unwrap();
//! let schedule = ExerciseSchedule::new(swaption.exercise_dates().to_vec()).unwrap();
//! let grid = schedule.refined_grid(12).unwrap();
//!
//! let config = EngineConfig::builder()
//!     .path_count(4_000)
//!     .antithetic(true)
//!     .build()
//!     .unwrap();
//! let result = LsmPricer::new(config)
//!     .price(&model, &swaption, &schedule, &grid)
//!     .unwrap();
//! assert!(result.estimate.mean > 0.0);
//! assert!(result.estimate.standard_error > 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

mod cancel;

pub mod greeks;
pub mod lsm;
pub mod mc;
pub mod rng;

// Re-export commonly used items for convenience
pub use cancel::CancellationToken;
pub use greeks::{BumpSpec, GreeksEngine, Sensitivity};
pub use lsm::{LsmPricer, LsmResult, PriceEstimate};
pub use mc::{EngineConfig, PathSimulator};
