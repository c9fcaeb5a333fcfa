//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

use clap::ValueEnum;

pub mod check;
pub mod greeks;
pub mod price;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}
