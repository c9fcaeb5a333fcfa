//! Greeks errors.

use pricer_core::market_data::MarketDataError;
use pricer_models::models::ModelError;
use thiserror::Error;

use crate::lsm::PricingError;

/// Failure of a bump-and-revalue run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GreeksError {
    /// Zero or non-finite bump size.
    #[error("invalid bump: {0}")]
    InvalidBump(String),

    /// The market shift was rejected.
    #[error("market bump failed: {0}")]
    Market(#[from] MarketDataError),

    /// The model could not be shifted or rebuilt.
    #[error("model bump failed: {0}")]
    Model(#[from] ModelError),

    /// One of the revaluations failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl GreeksError {
    /// Whether a revaluation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GreeksError::Pricing(e) if e.is_cancelled())
    }
}
