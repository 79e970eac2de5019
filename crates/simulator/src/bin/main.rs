//! Lamport Simulator CLI
//!
//! Runs a fully connected set of machines for a fixed wall-clock budget and
//! writes one log and one CSV file per machine.

use clap::Parser;
use lamport_simulator::{Simulator, SimulatorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lamport-sim")]
#[command(about = "Lamport logical clock simulation over independently ticking machines")]
#[command(version)]
struct Cli {
    /// Tick rate of each machine (comma-separated, one machine per value)
    #[arg(short, long, value_delimiter = ',', default_value = "4,5,6")]
    tick_rates: Vec<u32>,

    /// Seed for the random event draws
    #[arg(long, default_value = "0")]
    seed: u64,

    /// How long to run (e.g., "10s", "500ms", "1m")
    #[arg(short, long, default_value = "10s")]
    duration: humantime::Duration,

    /// Directory for the per-machine log and CSV files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip writing the per-machine files
    #[arg(long)]
    no_files: bool,

    /// Also write the run report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = SimulatorConfig::new(cli.tick_rates)
        .with_seed(cli.seed)
        .with_duration(*cli.duration)
        .with_output_dir(cli.output_dir);
    if cli.no_files {
        config = config.without_files();
    }

    println!(
        "Running {} machines for {:?}...",
        config.num_machines(),
        config.duration
    );
    let report = Simulator::new(config).run()?;
    report.print();

    if let Some(path) = cli.report_json {
        report.write_json(&path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
