//! # pricer_core: market data foundation
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace. It owns the market
//! inputs that rate models are built from:
//! - Yield curves (`market_data::curves`)
//! - Swaption volatility surfaces (`market_data::surfaces`)
//! - The read-only [`MarketDataProvider`](market_data::MarketDataProvider) contract
//! - Market snapshots and risk shifts (`market_data::snapshot`)
//!
//! Layer 1 has no dependencies on other pricer_* crates.
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, YieldCurve};
//!
//! let curve = InterpolatedCurve::new(
//!     &[1.0, 2.0, 5.0],
//!     &[0.02, 0.025, 0.03],
//!     CurveInterpolation::LogLinear,
//! )
//! .unwrap();
//! let fwd: f64 = curve.forward_rate(1.0, 2.0).unwrap();
//! assert!((fwd - 0.03).abs() < 1e-12);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
