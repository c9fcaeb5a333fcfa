//! Error types for the Monte Carlo engine.
//!
//! [`ConfigError`] is raised while building an [`EngineConfig`](super::EngineConfig);
//! [`SimulationError`] while validating inputs to, or running, the path
//! simulator.

use pricer_models::models::ModelError;
use thiserror::Error;

/// Configuration error for the engine.
///
/// These errors occur during construction when invalid parameters are provided.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Path count outside valid range [1, 10_000_000].
    #[error("Invalid path count {0}: must be in range [1, 10_000_000]")]
    InvalidPathCount(usize),
    /// Regression degree outside [1, 3].
    #[error("Invalid regression degree {0}: must be in range [1, 3]")]
    InvalidRegressionDegree(usize),
    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

/// Failure while generating a path ensemble.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Empty, non-finite, negative or non-increasing grid, or one that runs
    /// past the model horizon.
    #[error("invalid time grid: {0}")]
    InvalidGrid(String),

    /// Zero paths, or an odd count with antithetic pairing.
    #[error("invalid path count {count} (antithetic = {antithetic})")]
    InvalidPathCount {
        /// Requested path count
        count: usize,
        /// Whether antithetic pairing was requested
        antithetic: bool,
    },

    /// A state or numeraire left the finite, positive domain.
    #[error("numerical fault on path {path} at t = {time}: {detail}")]
    NumericalFault {
        /// Path index
        path: usize,
        /// Grid time
        time: f64,
        /// What went wrong
        detail: String,
    },

    /// The model could not be built or used.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Cancelled through a [`CancellationToken`](crate::CancellationToken).
    #[error("simulation cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidPathCount(0);
        assert!(err.to_string().contains("Invalid path count 0"));

        let err = ConfigError::InvalidRegressionDegree(4);
        assert!(err.to_string().contains("degree 4"));

        let err = ConfigError::InvalidParameter {
            name: "block_size",
            value: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("block_size"));
    }

    #[test]
    fn test_simulation_error_display() {
        let err = SimulationError::NumericalFault {
            path: 3,
            time: 1.5,
            detail: "numeraire is NaN".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("path 3") && msg.contains("1.5"));

        let err = SimulationError::from(ModelError::InvalidMeanReversion(-1.0));
        assert!(err.to_string().contains("mean_reversion must be positive"));
    }
}
