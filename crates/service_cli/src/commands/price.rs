//! Price command implementation
//!
//! Prices the run file's product with the LSM engine.

use anyhow::Context;
use pricer_pricing::lsm::{ExerciseDiagnostics, LsmPricer, PriceEstimate, PricingWarning};
use serde::Serialize;
use tracing::info;

use super::OutputFormat;
use crate::config::RunFile;

#[derive(Debug, Serialize)]
struct PriceReport<'a> {
    model: &'static str,
    estimate: PriceEstimate,
    confidence_95: f64,
    control_beta: Option<f64>,
    warnings: &'a [PricingWarning],
    exercise_dates: &'a [ExerciseDiagnostics],
}

/// Run the price command
pub fn run(run: &RunFile, format: OutputFormat) -> anyhow::Result<()> {
    let inputs = run.pricing_inputs()?;
    let model = inputs
        .model
        .build(&inputs.market)
        .context("cannot build model from [model] and [market]")?;
    info!(
        model = model.model_name(),
        paths = run.engine.path_count(),
        seed = run.engine.seed(),
        grid_points = inputs.grid.len(),
        "Starting pricing"
    );

    let result = LsmPricer::new(run.engine.clone()).price(
        &model,
        &inputs.payoff,
        &inputs.exercise,
        &inputs.grid,
    )?;

    let report = PriceReport {
        model: model.model_name(),
        estimate: result.estimate,
        confidence_95: result.estimate.confidence_95(),
        control_beta: result.control_beta,
        warnings: &result.warnings,
        exercise_dates: &result.diagnostics,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

fn print_table(report: &PriceReport<'_>) {
    println!("\n┌──────────────────┬──────────────────────┐");
    println!("│ Model            │ {:>20} │", report.model);
    println!("│ Price            │ {:>20.6} │", report.estimate.mean);
    println!("│ Std error        │ {:>20.6} │", report.estimate.standard_error);
    println!("│ 95% half-width   │ {:>20.6} │", report.confidence_95);
    println!("│ Paths            │ {:>20} │", report.estimate.path_count);
    if let Some(beta) = report.control_beta {
        println!("│ Control beta     │ {:>20.6} │", beta);
    }
    println!("└──────────────────┴──────────────────────┘");

    println!("\n┌──────────┬──────────┬───────────┬────────┬──────────┐");
    println!("│ Date     │ ITM      │ Exercised │ Degree │ Fallback │");
    println!("├──────────┼──────────┼───────────┼────────┼──────────┤");
    for d in report.exercise_dates {
        let degree = d
            .fitted_degree
            .map_or_else(|| "-".to_string(), |k| k.to_string());
        println!(
            "│ {:>8.4} │ {:>8} │ {:>9} │ {:>6} │ {:>8} │",
            d.time,
            d.itm_paths,
            d.exercised_paths,
            degree,
            if d.fallback { "yes" } else { "no" }
        );
    }
    println!("└──────────┴──────────┴───────────┴────────┴──────────┘");

    for w in report.warnings {
        println!("warning: {w}");
    }
}
