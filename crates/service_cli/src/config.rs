//! Run file loading.
//!
//! A run file is a TOML document with `[market]`, `[model]`, `[product]`,
//! an optional `[engine]` table and zero or more `[[bumps]]`. Path count and
//! seed can be overridden from the command line or through `LSM_PATHS` and
//! `LSM_SEED`.

use std::path::Path;

use anyhow::Context;
use pricer_core::market_data::{MarketQuotes, MarketSnapshot};
use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
use pricer_models::instruments::InstrumentError;
use pricer_models::models::ModelSpec;
use pricer_pricing::greeks::{BumpSpec, PricingInputs};
use pricer_pricing::lsm::ExerciseSchedule;
use pricer_pricing::mc::{ConfigError, EngineConfig};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Log levels accepted in a run file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn default_notional() -> f64 {
    1.0
}

/// Coterminal Bermudan swaption.
///
/// Exercisable at every period start unless `exercise_dates` restricts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSpec {
    /// Payer or receiver
    pub swaption_type: SwaptionType,
    /// Notional (default 1)
    #[serde(default = "default_notional")]
    pub notional: f64,
    /// Fixed rate
    pub strike: f64,
    /// Swap start (years)
    pub start: f64,
    /// Swap end (years)
    pub end: f64,
    /// Fixed leg period (years)
    pub period: f64,
    /// Subset of period starts to exercise on
    #[serde(default)]
    pub exercise_dates: Option<Vec<f64>>,
}

impl ProductSpec {
    /// Build the swaption.
    pub fn build(&self) -> Result<BermudanSwaption, InstrumentError> {
        let swaption = BermudanSwaption::coterminal(
            self.swaption_type,
            self.notional,
            self.strike,
            self.start,
            self.end,
            self.period,
        )?;
        match &self.exercise_dates {
            Some(dates) => BermudanSwaption::new(
                self.swaption_type,
                self.notional,
                self.strike,
                swaption.swap_dates().to_vec(),
                dates.clone(),
            ),
            None => Ok(swaption),
        }
    }
}

/// Parsed run file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Default log level when neither `--verbose` nor `RUST_LOG` is given
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    pub market: MarketQuotes,
    pub model: ModelSpec,
    pub product: ProductSpec,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Bumps for the `greeks` command
    #[serde(default)]
    pub bumps: Vec<BumpSpec>,
}

impl RunFile {
    /// Read and parse `path`.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(CliError::FileNotFound(display));
        }
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: display.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| CliError::Parse {
            path: display,
            source,
        })
    }

    /// Parse a run file from a string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply command-line / environment overrides and validate the engine
    /// configuration.
    pub fn with_overrides(
        mut self,
        paths: Option<usize>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if let Some(seed) = seed {
            self.engine = self.engine.with_seed(seed);
        }
        if let Some(paths) = paths {
            self.engine = self.engine.with_path_count(paths)?;
        }
        self.engine.validate()?;
        Ok(self)
    }

    /// Market, model, product, exercise schedule and simulation grid.
    pub fn pricing_inputs(&self) -> anyhow::Result<PricingInputs<BermudanSwaption>> {
        let market = MarketSnapshot::try_from(&self.market).context("invalid [market] quotes")?;
        let swaption = self.product.build().context("invalid [product]")?;
        let exercise = ExerciseSchedule::new(swaption.exercise_dates().to_vec())?;
        let inputs = PricingInputs::with_refined_grid(
            market,
            self.model.clone(),
            swaption,
            exercise,
            self.engine.steps_per_year(),
        )?;
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::market_data::MarketNode;
    use pricer_pricing::greeks::BumpTarget;

    const SAMPLE: &str = include_str!("../runs/bermudan_hull_white.toml");

    #[test]
    fn test_sample_run_file_parses() {
        let run = RunFile::parse(SAMPLE).unwrap();
        assert!(matches!(run.model, ModelSpec::HullWhite { .. }));
        assert_eq!(run.product.swaption_type, SwaptionType::Payer);
        assert_eq!(run.engine.path_count(), 20_000);
        assert!(run.engine.antithetic());
        assert_eq!(run.bumps.len(), 3);
        assert_eq!(run.bumps[0].target, BumpTarget::Market(MarketNode::ParallelRate));
        assert_eq!(run.log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_inputs_build() {
        let inputs = RunFile::parse(SAMPLE).unwrap().pricing_inputs().unwrap();
        assert_eq!(inputs.exercise.dates(), &[1.0, 2.0, 3.0, 4.0]);
        assert!(inputs.exercise.grid_indices(&inputs.grid).is_ok());
    }

    #[test]
    fn test_overrides() {
        let run = RunFile::parse(SAMPLE)
            .unwrap()
            .with_overrides(Some(500), Some(9))
            .unwrap();
        assert_eq!(run.engine.path_count(), 500);
        assert_eq!(run.engine.seed(), 9);

        let odd = RunFile::parse(SAMPLE).unwrap().with_overrides(Some(501), None);
        assert!(odd.is_err());
    }

    #[test]
    fn test_restricted_exercise_dates() {
        let mut run = RunFile::parse(SAMPLE).unwrap();
        run.product.exercise_dates = Some(vec![2.0, 4.0]);
        let swaption = run.product.build().unwrap();
        assert_eq!(swaption.exercise_dates(), &[2.0, 4.0]);
        assert_eq!(swaption.swap_dates().first(), Some(&1.0));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let broken = format!("unknown = 1\n{SAMPLE}");
        assert!(RunFile::parse(&broken).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RunFile::load(Path::new("does/not/exist.toml")),
            Err(CliError::FileNotFound(_))
        ));
    }
}
