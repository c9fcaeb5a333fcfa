//! Greeks command implementation
//!
//! Bump-and-revalues every `[[bumps]]` entry of the run file.

use pricer_pricing::greeks::{Difference, GreeksEngine, Sensitivity};
use tracing::info;

use super::OutputFormat;
use crate::config::RunFile;
use crate::CliError;

/// Run the greeks command
pub fn run(run: &RunFile, format: OutputFormat) -> anyhow::Result<()> {
    if run.bumps.is_empty() {
        return Err(CliError::InvalidArgument(
            "run file has no [[bumps]] entries".to_string(),
        )
        .into());
    }
    let inputs = run.pricing_inputs()?;
    info!(
        bumps = run.bumps.len(),
        paths = run.engine.path_count(),
        "Starting bump-and-revalue"
    );

    let sensitivities = GreeksEngine::new(run.engine.clone()).bump_all(&inputs, &run.bumps)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sensitivities)?),
        OutputFormat::Table => print_table(&sensitivities),
    }
    Ok(())
}

fn print_table(sensitivities: &[Sensitivity]) {
    println!("\n┌────────────────────┬──────────┬────────────┬───────────┬──────────────────┬──────────────────┐");
    println!("│ Target             │ Kind     │ Size       │ Scheme    │ Base             │ Sensitivity      │");
    println!("├────────────────────┼──────────┼────────────┼───────────┼──────────────────┼──────────────────┤");
    for s in sensitivities {
        let kind = format!("{:?}", s.kind).to_lowercase();
        let scheme = match s.difference {
            Difference::OneSided => "one-sided",
            Difference::Central => "central",
        };
        println!(
            "│ {:<18} │ {:<8} │ {:>10.2e} │ {:<9} │ {:>16.6} │ {:>16.6} │",
            s.target.to_string(),
            kind,
            s.size,
            scheme,
            s.base.mean,
            s.value
        );
    }
    println!("└────────────────────┴──────────┴────────────┴───────────┴──────────────────┴──────────────────┘");
}
