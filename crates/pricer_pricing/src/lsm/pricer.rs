//! Longstaff-Schwartz backward induction.
//!
//! Every path carries a future value in numeraire-rebased units, seeded
//! with the terminal exercise value floored at zero. Exercise dates are then visited latest
//! first. At each date the in-the-money paths regress their future value on
//! the state; a path exercises when its immediate value is at least the
//! predicted continuation, and its future value is overwritten with the
//! realised immediate value. The regression only decides; it never enters
//! the price.

use pricer_models::instruments::{Payoff, DATE_TOLERANCE};
use pricer_models::models::RateModel;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use super::basis::RegressionBasis;
use super::error::{PricingError, PricingWarning};
use super::projector::{CashflowPath, CashflowProjector};
use super::regression::RegressionEngine;
use crate::cancel::CancellationToken;
use crate::mc::{
    EngineConfig, PathEnsemble, PathSimulator, SimulationError, TimeGrid, DEFAULT_TOLERANCE,
};

/// Strictly increasing exercise dates; the last one is the terminal date
/// and is always exercisable.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::lsm::ExerciseSchedule;
///
/// let schedule = ExerciseSchedule::new(vec![1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(schedule.terminal(), 3.0);
/// assert!(ExerciseSchedule::new(vec![2.0, 1.0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSchedule {
    dates: Vec<f64>,
}

impl ExerciseSchedule {
    /// Validates and wraps `dates`.
    ///
    /// # Errors
    ///
    /// `InvalidExerciseDates` when empty, negative, non-finite or not
    /// strictly increasing.
    pub fn new(dates: Vec<f64>) -> Result<Self, PricingError> {
        if dates.is_empty() {
            return Err(PricingError::InvalidExerciseDates(
                "at least one exercise date is required".into(),
            ));
        }
        if let Some(t) = dates.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(PricingError::InvalidExerciseDates(format!(
                "exercise dates must be finite and non-negative, got {t}"
            )));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PricingError::InvalidExerciseDates(
                "exercise dates must be strictly increasing".into(),
            ));
        }
        Ok(Self { dates })
    }

    /// Single exercise at `maturity`.
    pub fn european(maturity: f64) -> Result<Self, PricingError> {
        Self::new(vec![maturity])
    }

    /// The dates.
    pub fn dates(&self) -> &[f64] {
        &self.dates
    }

    /// Terminal date.
    pub fn terminal(&self) -> f64 {
        self.dates[self.dates.len() - 1]
    }

    /// Grid indices of every date.
    ///
    /// # Errors
    ///
    /// `ExerciseDateNotOnGrid` for the first date without a grid point.
    pub fn grid_indices(&self, grid: &TimeGrid) -> Result<Vec<usize>, PricingError> {
        self.dates
            .iter()
            .map(|&date| {
                grid.index_of(date)
                    .ok_or(PricingError::ExerciseDateNotOnGrid { date })
            })
            .collect()
    }

    /// Uniform grid up to the terminal date with `steps_per_year` steps,
    /// containing every exercise date.
    pub fn refined_grid(&self, steps_per_year: usize) -> Result<TimeGrid, PricingError> {
        if self.terminal() <= DATE_TOLERANCE {
            return Ok(TimeGrid::new(vec![0.0])?);
        }
        Ok(TimeGrid::refined(self.terminal(), steps_per_year, &self.dates)?)
    }
}

/// Monte Carlo price with its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceEstimate {
    /// Price at the valuation date.
    pub mean: f64,
    /// Standard error of `mean`.
    pub standard_error: f64,
    /// Paths used.
    pub path_count: usize,
}

impl PriceEstimate {
    /// Half-width of the 95% confidence interval.
    #[inline]
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.standard_error
    }

    /// Half-width of the 99% confidence interval.
    #[inline]
    pub fn confidence_99(&self) -> f64 {
        2.576 * self.standard_error
    }
}

/// What happened at one exercise date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseDiagnostics {
    /// Exercise date.
    pub time: f64,
    /// Paths with positive immediate value.
    pub itm_paths: usize,
    /// Paths exercising at this date.
    pub exercised_paths: usize,
    /// Degree of the fitted continuation basis; `None` when no fit ran.
    pub fitted_degree: Option<usize>,
    /// Whether the regression fell back below the requested degree.
    pub fallback: bool,
}

/// Full pricing outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct LsmResult {
    /// Price and standard error.
    pub estimate: PriceEstimate,
    /// Non-fatal conditions.
    pub warnings: Vec<PricingWarning>,
    /// One entry per exercise date, earliest first.
    pub diagnostics: Vec<ExerciseDiagnostics>,
    /// Realised exercise cash flow of every path.
    pub cashflows: Vec<CashflowPath>,
    /// Control-variate coefficient, when a control was applied.
    pub control_beta: Option<f64>,
}

/// Least-Squares Monte Carlo pricer.
///
/// # Examples
///
/// ```rust
/// use pricer_core::market_data::MarketSnapshot;
/// use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
/// use pricer_models::models::{ModelSpec, SigmaSource};
/// use pricer_pricing::lsm::{ExerciseSchedule, LsmPricer};
/// use pricer_pricing::mc::EngineConfig;
///
/// let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
/// let model = ModelSpec::HullWhite {
///     mean_reversion: 0.05,
///     sigma: SigmaSource::Fixed { value: 0.01 },
///     curve_horizon: 10.0,
/// }
/// .build(&market)
/// .unwrap();
/// let swaption =
///     BermudanSwaption::coterminal(SwaptionType::Payer, 1.0, 0.03, 1.0, 4.0, 1.0).unwrap();
/// let schedule = ExerciseSchedule::new(swaption.exercise_dates().to_vec()).unwrap();
///
/// let config = EngineConfig::builder().path_count(2_000).antithetic(true).build().unwrap();
/// let grid = schedule.refined_grid(4).unwrap();
/// let result = LsmPricer::new(config)
///     .price(&model, &swaption, &schedule, &grid)
///     .unwrap();
/// assert!(result.estimate.mean > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LsmPricer {
    config: EngineConfig,
    cancel: Option<CancellationToken>,
}

impl LsmPricer {
    /// Pricer using `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Poll `token` between path blocks and between exercise dates.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulate `config.path_count()` paths over `grid` and price.
    ///
    /// # Errors
    ///
    /// Configuration and exercise-date errors are raised before any path is
    /// generated; simulation and payoff faults abort the call.
    pub fn price<P: Payoff + ?Sized>(
        &self,
        model: &RateModel,
        payoff: &P,
        exercise: &ExerciseSchedule,
        grid: &TimeGrid,
    ) -> Result<LsmResult, PricingError> {
        self.config.validate()?;
        exercise.grid_indices(grid)?;

        let mut simulator = PathSimulator::from_config(&self.config);
        if let Some(token) = &self.cancel {
            simulator = simulator.with_cancellation(token.clone());
        }
        let ensemble =
            simulator.generate(model, grid, self.config.path_count(), self.config.seed())?;
        self.price_paths(model, &ensemble, payoff, exercise)
    }

    /// Price on a pre-built ensemble.
    ///
    /// The control variate is applied when enabled in the configuration and
    /// present on the ensemble.
    pub fn price_paths<P: Payoff + ?Sized>(
        &self,
        model: &RateModel,
        ensemble: &PathEnsemble,
        payoff: &P,
        exercise: &ExerciseSchedule,
    ) -> Result<LsmResult, PricingError> {
        let indices = exercise.grid_indices(ensemble.grid())?;
        let n = ensemble.path_count();
        let span = info_span!(
            "lsm_price",
            model = model.model_name(),
            paths = n,
            exercise_dates = indices.len()
        );
        let _guard = span.enter();

        let projector = CashflowProjector::new(model, payoff, ensemble);
        let engine = RegressionEngine::new(
            RegressionBasis::new(self.config.basis_family(), self.config.regression_degree())
                .with_exercise_indicator(self.config.exercise_indicator()),
        );

        let last = indices.len() - 1;
        let terminal = projector.exercise_values(indices[last])?;
        // Terminal exercise is a right like any other: only positive values
        // are taken, the rest expire worthless.
        let mut future: Vec<f64> = terminal.rebased.iter().map(|&v| v.max(0.0)).collect();
        let mut exercised: Vec<Option<(usize, f64)>> = terminal
            .raw
            .iter()
            .map(|&v| (v > 0.0).then_some((indices[last], v)))
            .collect();
        let terminal_itm = exercised.iter().filter(|e| e.is_some()).count();

        let mut diagnostics = Vec::with_capacity(indices.len());
        diagnostics.push(ExerciseDiagnostics {
            time: terminal.time,
            itm_paths: terminal_itm,
            exercised_paths: terminal_itm,
            fitted_degree: None,
            fallback: false,
        });

        for &k in indices[..last].iter().rev() {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(SimulationError::Cancelled.into());
            }
            let values = projector.exercise_values(k)?;
            let itm: Vec<usize> = (0..n)
                .into_par_iter()
                .filter(|&p| values.rebased[p] > 0.0)
                .collect();

            if itm.is_empty() {
                debug!(time = values.time, "no paths in the money, skipping regression");
                diagnostics.push(ExerciseDiagnostics {
                    time: values.time,
                    itm_paths: 0,
                    exercised_paths: 0,
                    fitted_degree: None,
                    fallback: false,
                });
                continue;
            }

            let states: Vec<&[f64]> = itm.iter().map(|&p| ensemble.state(p, k)).collect();
            let immediates: Vec<f64> = itm.iter().map(|&p| values.rebased[p]).collect();
            let targets: Vec<f64> = itm.iter().map(|&p| future[p]).collect();
            let estimate = engine.fit(&states, &immediates, &targets);

            let decisions: Vec<bool> = states
                .par_iter()
                .zip(immediates.par_iter())
                .map(|(state, &h)| h >= estimate.predict(state, h))
                .collect();

            let mut exercised_paths = 0;
            for ((&p, &h), exercise_now) in itm.iter().zip(&immediates).zip(decisions) {
                if exercise_now {
                    future[p] = h;
                    exercised[p] = Some((k, values.raw[p]));
                    exercised_paths += 1;
                }
            }

            debug!(
                time = values.time,
                itm = itm.len(),
                exercised = exercised_paths,
                degree = estimate.basis().degree(),
                "exercise date processed"
            );
            diagnostics.push(ExerciseDiagnostics {
                time: values.time,
                itm_paths: itm.len(),
                exercised_paths,
                fitted_degree: Some(estimate.basis().degree()),
                fallback: estimate.fallback().is_some(),
            });
        }
        diagnostics.reverse();

        let control_beta = match ensemble.control() {
            Some(control) if self.config.control_variate() => {
                let beta = control_coefficient(&future, control.values(), control.expectation());
                for (y, c) in future.iter_mut().zip(control.values()) {
                    *y -= beta * (c - control.expectation());
                }
                Some(beta)
            }
            _ => None,
        };

        let (mean, standard_error, units) = sample_statistics(&future, ensemble.is_antithetic());
        let scale = ensemble.valuation_numeraire();
        let estimate = PriceEstimate {
            mean: mean * scale,
            standard_error: standard_error * scale,
            path_count: n,
        };

        let mut warnings = Vec::new();
        if units < 2 {
            warnings.push(PricingWarning::InsufficientPaths { path_count: n });
        }
        if let Some(tolerance) = self.config.std_error_tolerance() {
            if estimate.standard_error > tolerance {
                warnings.push(PricingWarning::Convergence {
                    standard_error: estimate.standard_error,
                    tolerance,
                });
            }
        }
        for w in &warnings {
            warn!(%w, "pricing warning");
        }
        if !estimate.mean.is_finite() {
            return Err(SimulationError::NumericalFault {
                path: 0,
                time: 0.0,
                detail: "aggregated price is not finite".into(),
            }
            .into());
        }

        info!(
            price = estimate.mean,
            std_error = estimate.standard_error,
            "LSM pricing complete"
        );
        Ok(LsmResult {
            estimate,
            warnings,
            diagnostics,
            cashflows: projector.cashflow_paths(&exercised),
            control_beta,
        })
    }
}

/// Variance-minimising control coefficient `cov(y, c) / var(c)`; zero when
/// the control is (numerically) constant.
fn control_coefficient(y: &[f64], c: &[f64], expectation: f64) -> f64 {
    let n = y.len() as f64;
    if y.len() < 2 {
        return 0.0;
    }
    let y_bar = y.iter().sum::<f64>() / n;
    let c_bar = c.iter().sum::<f64>() / n;
    let var_c = c.iter().map(|v| (v - c_bar).powi(2)).sum::<f64>() / (n - 1.0);
    if !(var_c.sqrt() > DEFAULT_TOLERANCE * expectation.abs()) {
        return 0.0;
    }
    let cov = y
        .iter()
        .zip(c)
        .map(|(a, b)| (a - y_bar) * (b - c_bar))
        .sum::<f64>()
        / (n - 1.0);
    cov / var_c
}

/// Mean, standard error and number of independent units.
///
/// Antithetic partners are averaged first so the error reflects the
/// dependence within each pair.
fn sample_statistics(values: &[f64], antithetic: bool) -> (f64, f64, usize) {
    let units: Vec<f64> = if antithetic {
        values.chunks_exact(2).map(|p| 0.5 * (p[0] + p[1])).collect()
    } else {
        values.to_vec()
    };
    let m = units.len();
    let mean = units.iter().sum::<f64>() / m as f64;
    if m < 2 {
        return (mean, 0.0, m);
    }
    let var = units.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / (m as f64 - 1.0);
    (mean, (var / m as f64).sqrt(), m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::MarketSnapshot;
    use pricer_models::instruments::{FnPayoff, Observation};
    use pricer_models::models::rates::HullWhite1F;

    fn model() -> RateModel {
        let market = MarketSnapshot::flat(0.03, 0.2).unwrap();
        HullWhite1F::from_market(&market, 0.1, 0.01, 5.0)
            .unwrap()
            .into()
    }

    #[test]
    fn test_schedule_validation() {
        assert!(ExerciseSchedule::new(vec![]).is_err());
        assert!(ExerciseSchedule::new(vec![1.0, 1.0]).is_err());
        assert!(ExerciseSchedule::new(vec![-1.0, 1.0]).is_err());
        assert!(ExerciseSchedule::new(vec![f64::INFINITY]).is_err());
        let s = ExerciseSchedule::european(2.0).unwrap();
        assert_eq!(s.dates(), &[2.0]);
    }

    #[test]
    fn test_date_off_grid_is_rejected() {
        let grid = TimeGrid::new(vec![1.0, 2.0]).unwrap();
        let s = ExerciseSchedule::new(vec![1.5, 2.0]).unwrap();
        assert_eq!(
            s.grid_indices(&grid).unwrap_err(),
            PricingError::ExerciseDateNotOnGrid { date: 1.5 }
        );
    }

    #[test]
    fn test_sample_statistics() {
        let (mean, se, units) = sample_statistics(&[1.0, 3.0, 5.0, 7.0], false);
        assert_relative_eq!(mean, 4.0);
        assert_relative_eq!(se, (20.0_f64 / 3.0 / 4.0).sqrt(), epsilon = 1e-15);
        assert_eq!(units, 4);

        let (mean, se, units) = sample_statistics(&[1.0, 3.0, 5.0, 7.0], true);
        assert_relative_eq!(mean, 4.0);
        assert_relative_eq!(se, 2.0, epsilon = 1e-15);
        assert_eq!(units, 2);

        assert_eq!(sample_statistics(&[2.5], false), (2.5, 0.0, 1));
    }

    #[test]
    fn test_control_coefficient_recovers_linear_dependence() {
        let c = [0.9, 1.0, 1.1, 0.95, 1.05];
        let y: Vec<f64> = c.iter().map(|v| 3.0 * v + 1.0).collect();
        assert_relative_eq!(control_coefficient(&y, &c, 1.0), 3.0, epsilon = 1e-12);
        assert_eq!(control_coefficient(&y, &[1.0; 5], 1.0), 0.0);
    }

    #[test]
    fn test_negative_terminal_value_is_not_exercised() {
        let grid = TimeGrid::new(vec![1.0]).unwrap();
        let ensemble = PathEnsemble::from_raw(
            grid,
            1,
            vec![0.05, -0.02, 0.01, -0.04],
            vec![1.05; 4],
            1.0,
            false,
        )
        .unwrap();
        let payoff = FnPayoff::new(|obs: &Observation<'_>| 100.0 * obs.state[0]);
        let config = EngineConfig::builder().path_count(4).build().unwrap();
        let result = LsmPricer::new(config)
            .price_paths(
                &model(),
                &ensemble,
                &payoff,
                &ExerciseSchedule::european(1.0).unwrap(),
            )
            .unwrap();

        assert_relative_eq!(result.estimate.mean, 6.0 / 1.05 / 4.0, max_relative = 1e-12);
        assert_eq!(result.diagnostics[0].itm_paths, 2);
        assert_eq!(result.diagnostics[0].exercised_paths, 2);
        assert!(result.cashflows[1].is_empty());
        assert!(result.cashflows[3].is_empty());
        assert_relative_eq!(result.cashflows[0].total(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_path_warns() {
        let grid = TimeGrid::new(vec![1.0]).unwrap();
        let ensemble = PathEnsemble::from_raw(grid, 1, vec![0.05], vec![1.05], 1.0, false).unwrap();
        let payoff = FnPayoff::new(|obs: &Observation<'_>| obs.state[0]);
        let config = EngineConfig::builder().path_count(1).build().unwrap();
        let result = LsmPricer::new(config)
            .price_paths(
                &model(),
                &ensemble,
                &payoff,
                &ExerciseSchedule::european(1.0).unwrap(),
            )
            .unwrap();
        assert_relative_eq!(result.estimate.mean, 0.05 / 1.05, epsilon = 1e-15);
        assert_eq!(result.estimate.standard_error, 0.0);
        assert_eq!(
            result.warnings,
            vec![PricingWarning::InsufficientPaths { path_count: 1 }]
        );
    }

    #[test]
    fn test_convergence_warning() {
        let grid = TimeGrid::new(vec![1.0]).unwrap();
        let ensemble = PathEnsemble::from_raw(
            grid,
            1,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0; 4],
            1.0,
            false,
        )
        .unwrap();
        let payoff = FnPayoff::new(|obs: &Observation<'_>| obs.state[0]);
        let config = EngineConfig::builder()
            .path_count(4)
            .std_error_tolerance(1e-3)
            .build()
            .unwrap();
        let result = LsmPricer::new(config)
            .price_paths(
                &model(),
                &ensemble,
                &payoff,
                &ExerciseSchedule::european(1.0).unwrap(),
            )
            .unwrap();
        assert!(matches!(
            result.warnings.as_slice(),
            [PricingWarning::Convergence { tolerance, .. }] if *tolerance == 1e-3
        ));
    }

    #[test]
    fn test_cancellation_between_dates() {
        let grid = TimeGrid::new(vec![1.0, 2.0]).unwrap();
        let ensemble =
            PathEnsemble::from_raw(grid, 1, vec![0.05, 0.04], vec![1.0, 1.1], 1.0, false).unwrap();
        let payoff = FnPayoff::new(|obs: &Observation<'_>| obs.state[0]);
        let token = CancellationToken::new();
        token.cancel();
        let err = LsmPricer::new(EngineConfig::default())
            .with_cancellation(token)
            .price_paths(
                &model(),
                &ensemble,
                &payoff,
                &ExerciseSchedule::new(vec![1.0, 2.0]).unwrap(),
            )
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
