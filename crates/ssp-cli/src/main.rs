//! Command-line runner for the stochastic shortest-path simulation.

mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use ssp_core::SimulationConfig;
use ssp_world::{find_best_path, ObservationSink, RunSummary, TracingSink, WriterSink};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ssp")]
#[command(version)]
#[command(about = "Find a low-cost path across a weighted grid by stochastic simulation")]
struct Cli {
    /// Simulation configuration (JSON). Runs the built-in demo instance if omitted
    config: Option<PathBuf>,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured simulation horizon
    #[arg(long)]
    final_instant: Option<f64>,

    /// Send observations to the log instead of stdout
    #[arg(long)]
    log_observations: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the default configuration as JSON and exit
    #[arg(long)]
    example_config: bool,

    /// Print the run summary as JSON when the run completes
    #[arg(long)]
    summary_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.example_config {
        let json = serde_json::to_string_pretty(&SimulationConfig::default())
            .context("Failed to serialize the default configuration")?;
        println!("{}", json);
        return Ok(());
    }

    telemetry::init_telemetry(cli.json_logs)?;

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            info!("No configuration given, running the demo instance");
            SimulationConfig::default()
        }
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(final_instant) = cli.final_instant {
        config.final_instant = final_instant;
    }

    let summary = if cli.log_observations {
        run(&config, TracingSink)?
    } else {
        run(&config, WriterSink::new(io::stdout().lock()))?
    };

    if cli.summary_json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize the run summary")?;
        println!("{}", json);
    }

    Ok(())
}

fn run<S: ObservationSink>(config: &SimulationConfig, sink: S) -> Result<RunSummary> {
    find_best_path(config.origin, config.goal, config, sink).context("Simulation failed")
}
