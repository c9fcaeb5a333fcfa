//! Instrument construction errors.

use thiserror::Error;

/// Instrument-related errors.
///
/// # Examples
/// ```
/// use pricer_models::instruments::InstrumentError;
///
/// let err = InstrumentError::InvalidStrike { strike: f64::NAN };
/// assert!(format!("{}", err).contains("NaN"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// Non-finite strike.
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// Non-positive or non-finite notional.
    #[error("Invalid notional: N = {notional}")]
    InvalidNotional {
        /// The invalid notional value
        notional: f64,
    },

    /// Schedule that is too short or not strictly increasing.
    #[error("Invalid schedule: {message}")]
    InvalidSchedule {
        /// Description of the problem
        message: String,
    },
}
