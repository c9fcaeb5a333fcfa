//! CLI error types.

use thiserror::Error;

/// Errors raised while loading and checking a run file.
#[derive(Debug, Error)]
pub enum CliError {
    /// Run file does not exist.
    #[error("run file not found: {0}")]
    FileNotFound(String),

    /// Run file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Run file is not valid TOML or has unknown fields.
    #[error("invalid run file {path}: {source}")]
    Parse {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Command requires something the run file lacks.
    #[error("{0}")]
    InvalidArgument(String),
}
