//! Finite-difference Greeks by bump-and-revalue.
//!
//! A [`BumpSpec`] names one input (a market quote or a model parameter),
//! a shift kind and size, and a difference scheme. [`GreeksEngine`] applies
//! it to a copy of the [`PricingInputs`], rebuilds the model and reprices
//! with the LSM pricer. By default bumped runs reuse the base seed so the
//! difference is not swamped by Monte Carlo noise.

mod bump;
mod engine;
mod error;

pub use bump::{BumpSpec, BumpTarget, Difference};
pub use engine::{GreeksEngine, PricingInputs, Sensitivity};
pub use error::GreeksError;
