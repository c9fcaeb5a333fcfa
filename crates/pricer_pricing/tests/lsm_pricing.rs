//! End-to-end LSM pricing tests.
//!
//! # Test Categories
//!
//! 1. **Determinism**: fixed seed gives bit-identical prices
//! 2. **No look-ahead**: a single exercise date reproduces plain MC
//! 3. **Exercise logic**: literal two-family scenario, empty ITM sets
//! 4. **Convergence**: standard error scales as 1/sqrt(paths)
//! 5. **Errors**: invalid configuration, grids and payoffs

use approx::assert_relative_eq;
use pricer_core::market_data::MarketSnapshot;
use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
use pricer_models::instruments::{FnPayoff, Observation, Payoff};
use pricer_models::models::rates::{LmmMeasure, VolSource};
use pricer_models::models::{CorrelationSpec, ModelSpec, RateModel, Scheme, SigmaSource};
use pricer_pricing::lsm::{ExerciseSchedule, LsmPricer, PricingError};
use pricer_pricing::mc::{
    ConfigError, EngineConfig, PathEnsemble, PathSimulator, SimulationError, TimeGrid,
};

fn market() -> MarketSnapshot {
    MarketSnapshot::flat(0.03, 0.2).unwrap()
}

fn hull_white() -> RateModel {
    ModelSpec::HullWhite {
        mean_reversion: 0.05,
        sigma: SigmaSource::Fixed { value: 0.01 },
        curve_horizon: 10.0,
    }
    .build(&market())
    .unwrap()
}

fn lmm() -> RateModel {
    ModelSpec::Lmm {
        horizon: 5.0,
        accrual: 1.0,
        measure: LmmMeasure::Spot,
        vols: VolSource::Flat { value: 0.2 },
        correlation: CorrelationSpec::default(),
    }
    .build(&market())
    .unwrap()
}

fn bermudan() -> (BermudanSwaption, ExerciseSchedule, TimeGrid) {
    let swaption =
        BermudanSwaption::coterminal(SwaptionType::Payer, 100.0, 0.03, 1.0, 5.0, 1.0).unwrap();
    let schedule = ExerciseSchedule::new(swaption.exercise_dates().to_vec()).unwrap();
    let grid = schedule.refined_grid(12).unwrap();
    (swaption, schedule, grid)
}

fn config(paths: usize) -> EngineConfig {
    EngineConfig::builder().path_count(paths).build().unwrap()
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_price() {
    let (swaption, schedule, grid) = bermudan();
    let model = hull_white();
    let a = LsmPricer::new(config(4_000))
        .price(&model, &swaption, &schedule, &grid)
        .unwrap();
    let b = LsmPricer::new(config(4_000))
        .price(&model, &swaption, &schedule, &grid)
        .unwrap();
    assert_eq!(a.estimate.mean.to_bits(), b.estimate.mean.to_bits());
    assert_eq!(a.estimate.standard_error, b.estimate.standard_error);
}

#[test]
fn test_price_independent_of_thread_count() {
    let (swaption, schedule, grid) = bermudan();
    let model = hull_white();
    let pricer = LsmPricer::new(config(3_000));
    let parallel = pricer.price(&model, &swaption, &schedule, &grid).unwrap();
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| pricer.price(&model, &swaption, &schedule, &grid))
        .unwrap();
    assert_eq!(parallel.estimate.mean.to_bits(), single.estimate.mean.to_bits());
}

#[test]
fn test_different_seed_different_price() {
    let (swaption, schedule, grid) = bermudan();
    let model = hull_white();
    let a = LsmPricer::new(config(2_000))
        .price(&model, &swaption, &schedule, &grid)
        .unwrap();
    let b = LsmPricer::new(config(2_000).with_seed(7))
        .price(&model, &swaption, &schedule, &grid)
        .unwrap();
    assert_ne!(a.estimate.mean, b.estimate.mean);
}

// ============================================================================
// No look-ahead
// ============================================================================

#[test]
fn test_single_exercise_date_equals_plain_monte_carlo() {
    let model = hull_white();
    let grid = TimeGrid::refined(2.0, 12, &[2.0]).unwrap();
    let ensemble = PathSimulator::new(Scheme::Exact)
        .generate(&model, &grid, 5_000, 11)
        .unwrap();
    let payoff = FnPayoff::new(|obs: &Observation<'_>| {
        let annuity = obs.zero_bond(3.0) + obs.zero_bond(4.0);
        (1.0 - obs.zero_bond(4.0) - 0.03 * annuity).max(0.0)
    });

    let result = LsmPricer::new(config(5_000))
        .price_paths(&model, &ensemble, &payoff, &ExerciseSchedule::european(2.0).unwrap())
        .unwrap();

    let last = grid.len() - 1;
    let direct = (0..ensemble.path_count())
        .map(|p| {
            let obs = Observation::new(2.0, ensemble.state(p, last), &model);
            payoff.exercise_value(&obs) / ensemble.numeraire(p, last)
        })
        .sum::<f64>()
        / ensemble.path_count() as f64
        * ensemble.valuation_numeraire();

    assert_relative_eq!(result.estimate.mean, direct, max_relative = 1e-12);
}

#[test]
fn test_bermudan_at_least_european_on_same_paths() {
    let (swaption, schedule, grid) = bermudan();
    let model = hull_white();
    let ensemble = PathSimulator::new(Scheme::Exact)
        .generate(&model, &grid, 8_000, 3)
        .unwrap();
    let pricer = LsmPricer::new(config(8_000));
    let bermudan = pricer
        .price_paths(&model, &ensemble, &swaption, &schedule)
        .unwrap();
    let european = pricer
        .price_paths(&model, &ensemble, &swaption, &ExerciseSchedule::european(1.0).unwrap())
        .unwrap();
    assert!(bermudan.estimate.mean > european.estimate.mean);
}

// ============================================================================
// Exercise logic
// ============================================================================

/// Three paths always in the money (10 now, 8 later) and one path that only
/// pays 5 at the terminal date.
#[test]
fn test_two_path_family_scenario() {
    let grid = TimeGrid::new(vec![1.0, 2.0]).unwrap();
    let states = vec![
        0.10, 0.08, // A
        0.10, 0.08, // A
        0.10, 0.08, // A
        0.00, 0.05, // B
    ];
    let numeraires = vec![1.05, 1.10, 1.05, 1.10, 1.05, 1.10, 1.05, 1.10];
    let ensemble = PathEnsemble::from_raw(grid, 1, states, numeraires, 1.0, false).unwrap();
    let payoff = FnPayoff::new(|obs: &Observation<'_>| 100.0 * obs.state[0].max(0.0));
    let schedule = ExerciseSchedule::new(vec![1.0, 2.0]).unwrap();

    let result = LsmPricer::new(config(4))
        .price_paths(&hull_white(), &ensemble, &payoff, &schedule)
        .unwrap();

    let expected = (3.0 * 10.0 / 1.05 + 5.0 / 1.10) / 4.0;
    assert_relative_eq!(result.estimate.mean, expected, max_relative = 1e-12);

    for a in &result.cashflows[..3] {
        assert_eq!(a.flows().len(), 1);
        assert_eq!(a.flows()[0].0, 1.0);
        assert_relative_eq!(a.flows()[0].1, 10.0, epsilon = 1e-12);
    }
    assert_eq!(result.cashflows[3].flows().len(), 1);
    assert_eq!(result.cashflows[3].flows()[0].0, 2.0);
    assert_relative_eq!(result.cashflows[3].flows()[0].1, 5.0, epsilon = 1e-12);

    assert_eq!(result.diagnostics[0].itm_paths, 3);
    assert_eq!(result.diagnostics[0].exercised_paths, 3);
}

#[test]
fn test_no_paths_in_the_money_skips_regression() {
    let model = hull_white();
    let grid = TimeGrid::refined(2.0, 12, &[1.0, 2.0]).unwrap();
    let ensemble = PathSimulator::new(Scheme::Exact)
        .generate(&model, &grid, 2_000, 5)
        .unwrap();
    let payoff = FnPayoff::new(|obs: &Observation<'_>| {
        if obs.time < 1.5 {
            0.0
        } else {
            (obs.state[0] - 0.03).max(0.0)
        }
    });
    let pricer = LsmPricer::new(config(2_000));
    let bermudan = pricer
        .price_paths(&model, &ensemble, &payoff, &ExerciseSchedule::new(vec![1.0, 2.0]).unwrap())
        .unwrap();
    let european = pricer
        .price_paths(&model, &ensemble, &payoff, &ExerciseSchedule::european(2.0).unwrap())
        .unwrap();

    assert_eq!(bermudan.diagnostics[0].itm_paths, 0);
    assert_eq!(bermudan.diagnostics[0].fitted_degree, None);
    assert_eq!(bermudan.estimate.mean, european.estimate.mean);
}

#[test]
fn test_lmm_bermudan_prices() {
    let (swaption, schedule, grid) = bermudan();
    let result = LsmPricer::new(config(2_000))
        .price(&lmm(), &swaption, &schedule, &grid)
        .unwrap();
    assert!(result.estimate.mean > 0.0);
    assert_eq!(result.diagnostics.len(), 4);
    assert!(result.diagnostics.windows(2).all(|w| w[0].time < w[1].time));
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn test_standard_error_scales_with_square_root_of_paths() {
    let (swaption, _, _) = bermudan();
    let schedule = ExerciseSchedule::european(1.0).unwrap();
    let grid = schedule.refined_grid(12).unwrap();
    let model = hull_white();
    let standard_error = |paths: usize, seed: u64| {
        LsmPricer::new(config(paths).with_seed(seed))
            .price(&model, &swaption, &schedule, &grid)
            .unwrap()
            .estimate
            .standard_error
    };
    let seeds = 11..19_u64;
    let ratios: Vec<f64> = seeds
        .map(|seed| standard_error(4_000, seed) / standard_error(16_000, seed))
        .collect();
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    assert!((1.85..2.15).contains(&mean), "mean ratio {mean} over {ratios:?}");
    assert!(ratios.iter().all(|r| (1.6..2.4).contains(r)), "ratios {ratios:?}");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_odd_path_count_with_antithetic_is_rejected() {
    let err = EngineConfig::builder()
        .path_count(101)
        .antithetic(true)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidParameter { name: "path_count", .. }));
}

#[test]
fn test_zero_paths_rejected() {
    assert_eq!(
        EngineConfig::builder().path_count(0).build().unwrap_err(),
        ConfigError::InvalidPathCount(0)
    );
}

#[test]
fn test_grid_beyond_tenor_structure_rejected() {
    let (swaption, schedule, _) = bermudan();
    let grid = TimeGrid::refined(6.0, 4, schedule.dates()).unwrap();
    let err = LsmPricer::new(config(100))
        .price(&lmm(), &swaption, &schedule, &grid)
        .unwrap_err();
    assert!(matches!(err, PricingError::Simulation(SimulationError::InvalidGrid(_))));
}

#[test]
fn test_exercise_date_missing_from_grid() {
    let (swaption, schedule, _) = bermudan();
    let grid = TimeGrid::new(vec![0.5, 1.0, 2.0, 3.0]).unwrap();
    let err = LsmPricer::new(config(100))
        .price(&hull_white(), &swaption, &schedule, &grid)
        .unwrap_err();
    assert_eq!(err, PricingError::ExerciseDateNotOnGrid { date: 4.0 });
}

#[test]
fn test_nan_payoff_is_fatal() {
    let schedule = ExerciseSchedule::european(1.0).unwrap();
    let grid = schedule.refined_grid(4).unwrap();
    let payoff = FnPayoff::new(|_: &Observation<'_>| f64::NAN);
    let err = LsmPricer::new(config(100))
        .price(&hull_white(), &payoff, &schedule, &grid)
        .unwrap_err();
    assert!(matches!(err, PricingError::NonFinitePayoff { time, .. } if time == 1.0));
}
