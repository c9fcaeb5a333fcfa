//! Market data consumed by rate-model construction.
//!
//! # Components
//!
//! - [`curves`]: yield curve trait and implementations (FlatCurve, InterpolatedCurve)
//! - [`surfaces`]: swaption volatility surfaces (FlatVol, SwaptionVolGrid)
//! - [`provider`]: the [`MarketDataProvider`] contract
//! - [`snapshot`]: [`MarketSnapshot`] and the shifts used for risk
//! - [`error`]: [`MarketDataError`]
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::{MarketDataProvider, MarketSnapshot};
//!
//! let market = MarketSnapshot::flat(0.05, 0.20).unwrap();
//! let df = market.discount_factor(1.0).unwrap();
//! assert!((df - 0.951229).abs() < 1e-5);
//! assert_eq!(market.volatility(2.0, 5.0).unwrap(), 0.20);
//! ```

pub mod curves;
pub mod error;
pub mod provider;
pub mod snapshot;
pub mod surfaces;

pub use curves::{CurveInterpolation, FlatCurve, InterpolatedCurve, YieldCurve};
pub use error::MarketDataError;
pub use provider::{CurveAndSurface, MarketDataProvider};
pub use snapshot::{MarketNode, MarketQuotes, MarketSnapshot, ShiftKind};
pub use surfaces::{FlatVol, SwaptionVolGrid, SwaptionVolSurface};
