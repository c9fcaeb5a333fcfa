//! lsm-pricer - Command Line Operations for the LSM Rates Engine
//!
//! This is the operational entry point for the Least-Squares Monte Carlo
//! pricing engine.
//!
//! # Commands
//!
//! - `lsm-pricer price --run <file>` - Price the run file's product
//! - `lsm-pricer greeks --run <file>` - Bump-and-revalue every `[[bumps]]` entry
//! - `lsm-pricer check [--run <file>]` - Validate a run file and the environment
//!
//! # Logging
//!
//! `RUST_LOG` wins when set. Otherwise `--verbose` selects `debug`, then the
//! run file's `log_level`, then `info`. Logs go to stderr so JSON output on
//! stdout stays machine-readable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

use commands::OutputFormat;
use config::{LogLevel, RunFile};
pub use error::CliError;

/// Least-Squares Monte Carlo pricer for Bermudan rates products
#[derive(Parser)]
#[command(name = "lsm-pricer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that run the engine.
#[derive(Args)]
struct RunArgs {
    /// Path to the TOML run file
    #[arg(short, long)]
    run: PathBuf,

    /// Override the engine path count
    #[arg(long, env = "LSM_PATHS")]
    paths: Option<usize>,

    /// Override the engine seed
    #[arg(long, env = "LSM_SEED")]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl RunArgs {
    fn load(&self) -> anyhow::Result<RunFile> {
        Ok(RunFile::load(&self.run)?.with_overrides(self.paths, self.seed)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Price the product described by a run file
    Price(RunArgs),

    /// Compute bump-and-revalue sensitivities
    Greeks(RunArgs),

    /// Check a run file and the runtime environment
    Check {
        /// Optional run file to validate
        #[arg(short, long)]
        run: Option<PathBuf>,
    },
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_filter_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let run = match &cli.command {
        Commands::Price(args) | Commands::Greeks(args) => Some(args.load()?),
        Commands::Check { run } => run.as_deref().map(RunFile::load).transpose()?,
    };

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        run.as_ref().and_then(|r| r.log_level).unwrap_or_default()
    };
    init_tracing(level);
    info!(version = env!("CARGO_PKG_VERSION"), "lsm-pricer");

    match (cli.command, run) {
        (Commands::Price(args), Some(run)) => commands::price::run(&run, args.format),
        (Commands::Greeks(args), Some(run)) => commands::greeks::run(&run, args.format),
        (Commands::Check { .. }, run) => commands::check::run(run.as_ref()),
        (_, None) => Err(CliError::InvalidArgument("a run file is required".to_string()).into()),
    }
}
