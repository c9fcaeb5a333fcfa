//! Bump-and-revalue sensitivities on top of the LSM pricer.

use pricer_core::market_data::{MarketSnapshot, ShiftKind};
use pricer_models::instruments::Payoff;
use pricer_models::models::ModelSpec;
use serde::Serialize;
use tracing::{debug, info_span};

use super::bump::{BumpSpec, BumpTarget, Difference};
use super::error::GreeksError;
use crate::cancel::CancellationToken;
use crate::lsm::{ExerciseSchedule, LsmPricer, PricingError, PriceEstimate};
use crate::mc::{EngineConfig, TimeGrid};
use crate::rng::substream_seed;

/// Substreams of the base seed used by reseeded bumped runs.
const UP_SUBSTREAM: u64 = 1;
const DOWN_SUBSTREAM: u64 = 2;

/// Everything a single valuation needs besides the engine configuration.
#[derive(Debug, Clone)]
pub struct PricingInputs<P> {
    /// Market the model is built from.
    pub market: MarketSnapshot,
    /// Model description.
    pub model: ModelSpec,
    /// Product.
    pub payoff: P,
    /// Exercise dates.
    pub exercise: ExerciseSchedule,
    /// Simulation grid, containing every exercise date.
    pub grid: TimeGrid,
}

impl<P> PricingInputs<P> {
    /// Bundle the inputs, refining the grid to `steps_per_year` around the
    /// exercise dates.
    ///
    /// # Errors
    ///
    /// Propagates grid construction failures.
    pub fn with_refined_grid(
        market: MarketSnapshot,
        model: ModelSpec,
        payoff: P,
        exercise: ExerciseSchedule,
        steps_per_year: usize,
    ) -> Result<Self, PricingError> {
        let grid = exercise.refined_grid(steps_per_year)?;
        Ok(Self {
            market,
            model,
            payoff,
            exercise,
            grid,
        })
    }
}

/// Result of one bump-and-revalue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensitivity {
    /// Bumped input.
    pub target: BumpTarget,
    /// Shift kind.
    pub kind: ShiftKind,
    /// Bump size `h`.
    pub size: f64,
    /// Difference scheme.
    pub difference: Difference,
    /// Unbumped price.
    pub base: PriceEstimate,
    /// Price with `+h`.
    pub up: PriceEstimate,
    /// Price with `-h`, central differences only.
    pub down: Option<PriceEstimate>,
    /// Finite-difference sensitivity.
    pub value: f64,
}

/// Finite-difference Greeks by full revaluation.
///
/// Base, up and (for central differences) down valuations run concurrently
/// through `rayon::join`. Each one rebuilds the model from the bumped inputs
/// and re-simulates from scratch.
///
/// # Examples
///
/// ```rust
/// use pricer_core::market_data::{MarketNode, MarketSnapshot};
/// use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
/// use pricer_models::models::{ModelSpec, SigmaSource};
/// use pricer_pricing::greeks::{BumpSpec, BumpTarget, GreeksEngine, PricingInputs};
/// use pricer_pricing::lsm::ExerciseSchedule;
/// use pricer_pricing::mc::EngineConfig;
///
/// let swaption =
///     BermudanSwaption::coterminal(SwaptionType::Payer, 100.0, 0.03, 1.0, 3.0, 1.0).unwrap();
/// let exercise = ExerciseSchedule::new(swaption.exercise_dates().to_vec()).unwrap();
/// let inputs = PricingInputs::with_refined_grid(
///     MarketSnapshot::flat(0.03, 0.2).unwrap(),
///     ModelSpec::HullWhite {
///         mean_reversion: 0.05,
///         sigma: SigmaSource::Fixed { value: 0.01 },
///         curve_horizon: 10.0,
///     },
///     swaption,
///     exercise,
///     12,
/// )
/// .unwrap();
///
/// let config = EngineConfig::builder().path_count(2_000).build().unwrap();
/// let delta = GreeksEngine::new(config)
///     .bump_and_revalue(&inputs, &BumpSpec::new(BumpTarget::Market(MarketNode::ParallelRate), 1e-3))
///     .unwrap();
/// assert!(delta.value > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct GreeksEngine {
    config: EngineConfig,
    cancel: Option<CancellationToken>,
}

impl GreeksEngine {
    /// Engine revaluing with `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Share `token` with every revaluation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sensitivity of the price to `bump`.
    ///
    /// # Errors
    ///
    /// `InvalidBump` for a zero or non-finite size, `Market`/`Model` when the
    /// bumped inputs are rejected, `Pricing` when any revaluation fails.
    pub fn bump_and_revalue<P: Payoff>(
        &self,
        inputs: &PricingInputs<P>,
        bump: &BumpSpec,
    ) -> Result<Sensitivity, GreeksError> {
        bump.validate()?;
        self.config.validate().map_err(PricingError::from)?;

        let span = info_span!(
            "bump_and_revalue",
            target = %bump.target,
            size = bump.size,
            difference = ?bump.difference,
            crn = bump.common_random_numbers
        );
        let _guard = span.enter();

        let up_inputs = bump.apply(&inputs.market, &inputs.model, 1.0)?;
        let down_inputs = match bump.difference {
            Difference::Central => Some(bump.apply(&inputs.market, &inputs.model, -1.0)?),
            Difference::OneSided => None,
        };

        let seed = self.config.seed();
        let (up_seed, down_seed) = if bump.common_random_numbers {
            (seed, seed)
        } else {
            (
                substream_seed(seed, UP_SUBSTREAM),
                substream_seed(seed, DOWN_SUBSTREAM),
            )
        };

        let (base, (up, down)) = rayon::join(
            || self.revalue(&inputs.market, &inputs.model, inputs, seed),
            || {
                rayon::join(
                    || self.revalue(&up_inputs.0, &up_inputs.1, inputs, up_seed),
                    || {
                        down_inputs
                            .as_ref()
                            .map(|(market, model)| self.revalue(market, model, inputs, down_seed))
                            .transpose()
                    },
                )
            },
        );
        let (base, up, down) = (base?, up?, down?);

        let value = match down {
            Some(down) => (up.mean - down.mean) / (2.0 * bump.size),
            None => (up.mean - base.mean) / bump.size,
        };
        debug!(base = base.mean, up = up.mean, value, "sensitivity");

        Ok(Sensitivity {
            target: bump.target,
            kind: bump.kind,
            size: bump.size,
            difference: bump.difference,
            base,
            up,
            down,
            value,
        })
    }

    /// One sensitivity per bump, in order. Stops at the first failure.
    pub fn bump_all<P: Payoff>(
        &self,
        inputs: &PricingInputs<P>,
        bumps: &[BumpSpec],
    ) -> Result<Vec<Sensitivity>, GreeksError> {
        bumps
            .iter()
            .map(|bump| self.bump_and_revalue(inputs, bump))
            .collect()
    }

    fn revalue<P: Payoff>(
        &self,
        market: &MarketSnapshot,
        spec: &ModelSpec,
        inputs: &PricingInputs<P>,
        seed: u64,
    ) -> Result<PriceEstimate, GreeksError> {
        let model = spec.build(market)?;
        let mut pricer = LsmPricer::new(self.config.with_seed(seed));
        if let Some(token) = &self.cancel {
            pricer = pricer.with_cancellation(token.clone());
        }
        let result = pricer.price(&model, &inputs.payoff, &inputs.exercise, &inputs.grid)?;
        Ok(result.estimate)
    }
}
