//! Market data error types.
//!
//! Every failure raised while building or querying curves, swaption
//! volatility grids and market snapshots is reported through
//! [`MarketDataError`].

use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Negative (or otherwise unusable) time to maturity.
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Non-positive option expiry or swap tenor.
    #[error("Invalid expiry: T = {expiry}")]
    InvalidExpiry {
        /// The invalid expiry value
        expiry: f64,
    },

    /// Negative volatility quote.
    #[error("Invalid volatility: sigma = {vol}")]
    InvalidVolatility {
        /// The offending quote
        vol: f64,
    },

    /// Axis values that are not strictly increasing.
    #[error("Axis '{axis}' is not strictly increasing at {value}")]
    NonMonotonicAxis {
        /// Axis name
        axis: &'static str,
        /// First value breaking the ordering
        value: f64,
    },

    /// NaN or infinite input.
    #[error("Non-finite {what}: {value}")]
    NonFinite {
        /// Which quantity was non-finite
        what: &'static str,
        /// The value itself
        value: f64,
    },

    /// Node index outside the available pillars.
    #[error("Out of bounds: {x} not in [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// A shift that cannot be applied to the snapshot.
    #[error("Invalid market shift: {0}")]
    InvalidShift(String),
}
