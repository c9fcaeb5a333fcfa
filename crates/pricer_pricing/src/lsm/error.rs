//! LSM pricing errors and warnings.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::mc::{ConfigError, SimulationError};

/// Fatal pricing failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Path generation failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Exercise dates are empty, unsorted, negative or non-finite.
    #[error("invalid exercise dates: {0}")]
    InvalidExerciseDates(String),

    /// An exercise date has no grid point within tolerance.
    #[error("exercise date {date} is not on the simulation grid")]
    ExerciseDateNotOnGrid {
        /// The missing date
        date: f64,
    },

    /// The payoff returned NaN or infinity.
    #[error("payoff returned {value} on path {path} at t = {time}")]
    NonFinitePayoff {
        /// Path index
        path: usize,
        /// Exercise time
        time: f64,
        /// Returned value
        value: f64,
    },

    /// Invalid engine configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PricingError {
    /// Whether the call was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PricingError::Simulation(SimulationError::Cancelled))
    }
}

/// Non-fatal condition reported alongside a price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingWarning {
    /// Too few paths for a standard error; it is reported as zero.
    InsufficientPaths {
        /// Path count used
        path_count: usize,
    },
    /// Standard error above the caller's tolerance.
    Convergence {
        /// Achieved standard error
        standard_error: f64,
        /// Requested tolerance
        tolerance: f64,
    },
}

impl fmt::Display for PricingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientPaths { path_count } => write!(
                f,
                "{path_count} path(s) cannot support a standard error; reported as 0"
            ),
            Self::Convergence {
                standard_error,
                tolerance,
            } => write!(
                f,
                "standard error {standard_error:.3e} exceeds tolerance {tolerance:.3e}"
            ),
        }
    }
}
