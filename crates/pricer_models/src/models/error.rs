//! Rate model construction errors.

use pricer_core::market_data::MarketDataError;
use thiserror::Error;

/// Errors raised while building or shifting a rate model.
///
/// Simulation itself never fails inside a model; numerical breakdown is
/// surfaced as non-finite state values and caught by the simulator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Non-positive mean reversion speed.
    #[error("mean_reversion must be positive, got {0}")]
    InvalidMeanReversion(f64),

    /// Non-positive volatility.
    #[error("volatility must be positive, got {0}")]
    InvalidVolatility(f64),

    /// Any other out-of-range scalar parameter.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Tenor structure that is empty, unsorted or does not start at zero.
    #[error("Invalid tenor structure: {0}")]
    InvalidTenorStructure(String),

    /// Correlation input that is not a valid correlation matrix.
    #[error("Invalid correlation: {0}")]
    InvalidCorrelation(String),

    /// Cholesky factorisation failed.
    #[error("Correlation matrix is not positive definite")]
    CorrelationNotPositiveDefinite,

    /// Vector of the wrong length.
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being sized
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Parameter shift that does not apply to the model.
    #[error("Unsupported parameter shift: {0}")]
    UnsupportedShift(String),

    /// Market data lookup failed during construction.
    #[error("Market data error: {0}")]
    Market(#[from] MarketDataError),
}
