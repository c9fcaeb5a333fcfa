//! Variance reduction and numeraire consistency tests.
//!
//! Repeated trials with independent seeds are compared by the spread of
//! their price estimates, so the assertions do not depend on any single
//! seed being lucky.

use approx::assert_relative_eq;
use pricer_core::market_data::curves::CurveInterpolation;
use pricer_core::market_data::{MarketQuotes, MarketSnapshot};
use pricer_models::instruments::{FnPayoff, Observation};
use pricer_models::models::rates::{LmmMeasure, VolSource};
use pricer_models::models::{CorrelationSpec, ModelSpec, RateModel, Scheme, SigmaSource};
use pricer_pricing::lsm::{ExerciseSchedule, LsmPricer};
use pricer_pricing::mc::{EngineConfig, PathSimulator, TimeGrid};

fn hull_white() -> RateModel {
    ModelSpec::HullWhite {
        mean_reversion: 0.05,
        sigma: SigmaSource::Fixed { value: 0.01 },
        curve_horizon: 10.0,
    }
    .build(&MarketSnapshot::flat(0.03, 0.2).unwrap())
    .unwrap()
}

/// Hull-White fitted to an upward-sloping curve.
fn sloped_hull_white() -> RateModel {
    let quotes = MarketQuotes {
        tenors: vec![1.0, 2.0, 5.0, 10.0],
        zero_rates: vec![0.025, 0.028, 0.031, 0.033],
        interpolation: CurveInterpolation::Linear,
        vol_expiries: vec![1.0],
        vol_tenors: vec![1.0],
        vols: vec![vec![0.2]],
    };
    ModelSpec::HullWhite {
        mean_reversion: 0.05,
        sigma: SigmaSource::Fixed { value: 0.01 },
        curve_horizon: 10.0,
    }
    .build(&MarketSnapshot::try_from(&quotes).unwrap())
    .unwrap()
}

fn sample_variance(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

/// European claim on a 3y zero bond observed at 2y.
fn bond_claim() -> FnPayoff<impl Fn(&Observation<'_>) -> f64 + Send + Sync> {
    FnPayoff::new(|obs: &Observation<'_>| 100.0 * obs.zero_bond(3.0))
}

fn trial_means(config: &EngineConfig, trials: u64) -> Vec<f64> {
    let model = hull_white();
    let schedule = ExerciseSchedule::european(2.0).unwrap();
    let grid = schedule.refined_grid(12).unwrap();
    let payoff = bond_claim();
    (0..trials)
        .map(|seed| {
            LsmPricer::new(config.with_seed(1_000 + seed))
                .price(&model, &payoff, &schedule, &grid)
                .unwrap()
                .estimate
                .mean
        })
        .collect()
}

// ============================================================================
// Antithetic variates
// ============================================================================

#[test]
fn test_antithetic_reduces_variance_over_trials() {
    let plain = EngineConfig::builder().path_count(1_000).build().unwrap();
    let anti = EngineConfig::builder()
        .path_count(1_000)
        .antithetic(true)
        .build()
        .unwrap();
    let v_plain = sample_variance(&trial_means(&plain, 20));
    let v_anti = sample_variance(&trial_means(&anti, 20));
    assert!(v_anti < v_plain, "antithetic {v_anti} vs plain {v_plain}");
}

#[test]
fn test_antithetic_standard_error_uses_pairs() {
    let model = hull_white();
    let schedule = ExerciseSchedule::european(2.0).unwrap();
    let grid = schedule.refined_grid(12).unwrap();
    let config = EngineConfig::builder()
        .path_count(2_000)
        .antithetic(true)
        .build()
        .unwrap();
    let result = LsmPricer::new(config)
        .price(&model, &bond_claim(), &schedule, &grid)
        .unwrap();
    assert_eq!(result.estimate.path_count, 2_000);
    assert!(result.estimate.standard_error > 0.0);
    assert!(result.warnings.is_empty());
}

// ============================================================================
// Control variate
// ============================================================================

#[test]
fn test_control_variate_shrinks_standard_error() {
    let model = hull_white();
    let schedule = ExerciseSchedule::european(2.0).unwrap();
    let grid = schedule.refined_grid(12).unwrap();
    let base = EngineConfig::builder().path_count(4_000).build().unwrap();
    let with_cv = EngineConfig::builder()
        .path_count(4_000)
        .control_variate(true)
        .build()
        .unwrap();

    let plain = LsmPricer::new(base)
        .price(&model, &bond_claim(), &schedule, &grid)
        .unwrap();
    let controlled = LsmPricer::new(with_cv)
        .price(&model, &bond_claim(), &schedule, &grid)
        .unwrap();

    assert!(plain.control_beta.is_none());
    assert!(controlled.control_beta.is_some_and(|b| b > 0.0));
    assert!(controlled.estimate.standard_error < 0.5 * plain.estimate.standard_error);
    // Claim on P(2, 3) is worth P(0, 3) today.
    assert_relative_eq!(
        controlled.estimate.mean,
        100.0 * model.initial_zero_bond(3.0),
        max_relative = 2e-3
    );
}

// ============================================================================
// Numeraire consistency
// ============================================================================

fn deflated_bond_error(model: &RateModel, scheme: Scheme, maturity: f64, paths: usize) {
    let grid = TimeGrid::refined(maturity, 12, &[maturity]).unwrap();
    let ensemble = PathSimulator::new(scheme)
        .with_antithetic(true)
        .generate(model, &grid, paths, 99)
        .unwrap();
    let last = grid.len() - 1;
    let n0 = ensemble.valuation_numeraire();
    let samples: Vec<f64> = (0..paths)
        .map(|p| n0 / ensemble.numeraire(p, last))
        .collect();
    let mean = samples.iter().sum::<f64>() / paths as f64;
    let se = (sample_variance(&samples) / paths as f64).sqrt();
    let target = model.initial_zero_bond(maturity);
    assert!(
        (mean - target).abs() < 4.0 * se + 2e-4,
        "{scheme:?}: E[N0/N(T)] = {mean}, P(0,T) = {target}, se = {se}"
    );
}

#[test]
fn test_hull_white_deflator_reprices_curve_exact() {
    deflated_bond_error(&hull_white(), Scheme::Exact, 5.0, 20_000);
}

#[test]
fn test_hull_white_deflator_reprices_curve_euler() {
    deflated_bond_error(&hull_white(), Scheme::Euler, 5.0, 20_000);
}

#[test]
fn test_hull_white_deflator_reprices_sloped_curve() {
    // Monthly grid points coincide with the sampled curve pillars.
    for scheme in [Scheme::Exact, Scheme::Euler] {
        deflated_bond_error(&sloped_hull_white(), scheme, 4.0, 20_000);
    }
}

#[test]
fn test_hull_white_euler_short_rate_stays_near_forward() {
    let model = sloped_hull_white();
    let grid = TimeGrid::refined(4.0, 12, &[4.0]).unwrap();
    let paths = 10_000;
    let ensemble = PathSimulator::new(Scheme::Euler)
        .with_antithetic(true)
        .generate(&model, &grid, paths, 5)
        .unwrap();
    let last = grid.len() - 1;
    let mean_rate = (0..paths).map(|p| ensemble.state(p, last)[0]).sum::<f64>() / paths as f64;
    assert!(
        (0.02..0.05).contains(&mean_rate),
        "mean short rate at 4y = {mean_rate}"
    );
}

#[test]
fn test_lmm_deflator_reprices_curve() {
    for measure in [LmmMeasure::Spot, LmmMeasure::Terminal] {
        let model = ModelSpec::Lmm {
            horizon: 5.0,
            accrual: 1.0,
            measure,
            vols: VolSource::Flat { value: 0.15 },
            correlation: CorrelationSpec::default(),
        }
        .build(&MarketSnapshot::flat(0.03, 0.2).unwrap())
        .unwrap();
        deflated_bond_error(&model, Scheme::Exact, 3.0, 10_000);
    }
}

#[test]
fn test_hull_white_initial_bond_matches_market() {
    let model = hull_white();
    let mut state = vec![0.0; model.state_dim()];
    model.initial_state(&mut state);
    for t in [0.5, 1.0, 4.0, 9.0] {
        assert_relative_eq!(
            model.zero_bond(0.0, t, &state),
            (-0.03 * t).exp(),
            max_relative = 1e-6
        );
    }
}
