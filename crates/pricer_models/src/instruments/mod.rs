//! Products priced by the engine.
//!
//! - [`Payoff`]: pure, total exercise value per path and date
//! - [`Observation`]: time, state and model bond prices seen by a payoff
//! - [`FnPayoff`]: closure adapter
//! - [`rates`]: Bermudan swaptions

pub mod error;
pub mod payoff;
pub mod rates;

pub use error::InstrumentError;
pub use payoff::{FnPayoff, Observation, Payoff, DATE_TOLERANCE};
