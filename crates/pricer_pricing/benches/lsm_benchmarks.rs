//! Criterion benchmarks for path generation and LSM pricing.
//!
//! Benchmarks cover:
//! - Substream normal generation
//! - Path generation per model (Hull-White, LMM, SABR-LMM)
//! - Bermudan swaption LSM pricing with varying path counts
//! - Regression degree scaling
//! - Bump-and-revalue delta

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::market_data::{MarketNode, MarketSnapshot};
use pricer_models::instruments::rates::{BermudanSwaption, SwaptionType};
use pricer_models::models::rates::{LmmMeasure, VolSource};
use pricer_models::models::{CorrelationSpec, ModelSpec, RateModel, Scheme, SigmaSource};
use pricer_pricing::greeks::{BumpSpec, BumpTarget, GreeksEngine, PricingInputs};
use pricer_pricing::lsm::{ExerciseSchedule, LsmPricer};
use pricer_pricing::mc::{EngineConfig, PathSimulator};
use pricer_pricing::rng::SubstreamRng;

fn market() -> MarketSnapshot {
    MarketSnapshot::flat(0.03, 0.2).unwrap()
}

fn hull_white_spec() -> ModelSpec {
    ModelSpec::HullWhite {
        mean_reversion: 0.05,
        sigma: SigmaSource::Fixed { value: 0.01 },
        curve_horizon: 15.0,
    }
}

fn models() -> Vec<(&'static str, RateModel)> {
    let specs = [
        ("hull_white", hull_white_spec()),
        (
            "lmm",
            ModelSpec::Lmm {
                horizon: 10.0,
                accrual: 1.0,
                measure: LmmMeasure::Spot,
                vols: VolSource::Market,
                correlation: CorrelationSpec::default(),
            },
        ),
        (
            "sabr_lmm",
            ModelSpec::SabrLmm {
                horizon: 10.0,
                accrual: 1.0,
                vols: VolSource::Market,
                beta: 0.5,
                vol_of_vol: 0.3,
                rho_sv: -0.3,
                correlation: CorrelationSpec::default(),
            },
        ),
    ];
    specs
        .into_iter()
        .map(|(name, spec)| (name, spec.build(&market()).unwrap()))
        .collect()
}

/// 1y x 10y coterminal payer Bermudan, annual exercise.
fn bermudan() -> (BermudanSwaption, ExerciseSchedule) {
    let swaption =
        BermudanSwaption::coterminal(SwaptionType::Payer, 100.0, 0.03, 1.0, 10.0, 1.0).unwrap();
    let schedule = ExerciseSchedule::new(swaption.exercise_dates().to_vec()).unwrap();
    (swaption, schedule)
}

fn bench_rng(c: &mut Criterion) {
    let mut group = c.benchmark_group("rng");
    for n in [1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("fill_normal", n), &n, |b, &n| {
            let mut rng = SubstreamRng::new(42, 0);
            let mut buffer = vec![0.0; n];
            b.iter(|| {
                rng.fill_normal(&mut buffer);
                black_box(buffer.iter().sum::<f64>())
            });
        });
    }
    group.finish();
}

fn bench_path_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_generation");
    group.sample_size(20);

    let (_, schedule) = bermudan();
    let grid = schedule.refined_grid(12).unwrap();
    for (name, model) in models() {
        group.bench_with_input(BenchmarkId::new(name, 10_000), &model, |b, model| {
            let simulator = PathSimulator::new(Scheme::Exact).with_antithetic(true);
            b.iter(|| black_box(simulator.generate(model, &grid, 10_000, 42).unwrap()));
        });
    }
    group.finish();
}

fn bench_lsm_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("lsm_pricing");
    group.sample_size(10);

    let model = hull_white_spec().build(&market()).unwrap();
    let (swaption, schedule) = bermudan();
    let grid = schedule.refined_grid(12).unwrap();

    for n_paths in [1_000, 10_000, 50_000] {
        group.bench_with_input(
            BenchmarkId::new("bermudan_hull_white", n_paths),
            &n_paths,
            |b, &n| {
                let pricer = LsmPricer::new(
                    EngineConfig::builder()
                        .path_count(n)
                        .antithetic(true)
                        .control_variate(true)
                        .build()
                        .unwrap(),
                );
                b.iter(|| black_box(pricer.price(&model, &swaption, &schedule, &grid).unwrap()));
            },
        );
    }

    for degree in 1..=3 {
        group.bench_with_input(
            BenchmarkId::new("regression_degree", degree),
            &degree,
            |b, &d| {
                let pricer = LsmPricer::new(
                    EngineConfig::builder()
                        .path_count(10_000)
                        .regression_degree(d)
                        .build()
                        .unwrap(),
                );
                b.iter(|| black_box(pricer.price(&model, &swaption, &schedule, &grid).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_greeks(c: &mut Criterion) {
    let mut group = c.benchmark_group("greeks");
    group.sample_size(10);

    let (swaption, schedule) = bermudan();
    let inputs =
        PricingInputs::with_refined_grid(market(), hull_white_spec(), swaption, schedule, 12)
            .unwrap();
    let engine = GreeksEngine::new(EngineConfig::builder().path_count(10_000).build().unwrap());
    let bump = BumpSpec::new(BumpTarget::Market(MarketNode::ParallelRate), 1e-4);

    group.bench_function("parallel_delta_10k", |b| {
        b.iter(|| black_box(engine.bump_and_revalue(&inputs, &bump).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rng,
    bench_path_generation,
    bench_lsm_pricing,
    bench_greeks
);
criterion_main!(benches);
