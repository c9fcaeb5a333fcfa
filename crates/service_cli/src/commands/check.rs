//! Check command implementation
//!
//! Reports the build and thread pool, and, given a run file, validates it
//! end to end without simulating.

use pricer_models::instruments::DATE_TOLERANCE;
use tracing::info;

use crate::config::RunFile;

/// Run the check command
pub fn run(run: Option<&RunFile>) -> anyhow::Result<()> {
    println!("lsm-pricer {}", env!("CARGO_PKG_VERSION"));
    println!("  rayon threads: {}", rayon::current_num_threads());

    let Some(run) = run else {
        println!("  no run file given; nothing else to check");
        return Ok(());
    };

    run.engine.validate()?;
    let inputs = run.pricing_inputs()?;
    let model = inputs.model.build(&inputs.market)?;
    inputs.exercise.grid_indices(&inputs.grid)?;
    let last = inputs.grid.last();
    if last > model.horizon() + DATE_TOLERANCE {
        anyhow::bail!(
            "simulation grid ends at {last} but {} is only defined up to {}",
            model.model_name(),
            model.horizon()
        );
    }

    for bump in &run.bumps {
        bump.validate()?;
    }

    info!(model = model.model_name(), "run file is valid");
    println!("  model:          {}", model.model_name());
    println!(
        "  state / shocks: {} / {}",
        model.state_dim(),
        model.brownian_dim(run.engine.scheme())
    );
    println!("  scheme:         {}", run.engine.scheme());
    println!("  exercise dates: {:?}", inputs.exercise.dates());
    println!("  grid points:    {}", inputs.grid.len());
    println!(
        "  paths:          {}{}",
        run.engine.path_count(),
        if run.engine.antithetic() { " (antithetic)" } else { "" }
    );
    println!("  seed:           {}", run.engine.seed());
    println!("  bumps:          {}", run.bumps.len());
    Ok(())
}
