//! Pick the best model among several metrics records.

use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::logging;
use mlstage::stages::select::{Constraint, compare_models};

#[derive(Debug, Parser)]
#[command(name = "mlstage-select", about = "Compare metrics records and pick a winner")]
struct Cli {
    /// Metrics JSON files or directories of them.
    #[arg(long = "metrics", required = true, num_args = 1..)]
    metrics: Vec<PathBuf>,
    /// minimize_fp, minimize_fn or maximize_f1.
    #[arg(long)]
    constraint: Option<String>,
    /// Comparison report destination.
    #[arg(long)]
    output: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    if let Err(err) = logging::init("mlstage-select") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let constraint = Constraint::parse_or_default(
        cli.constraint.as_deref().unwrap_or(&config.select.constraint),
    );
    let report =
        compare_models(&cli.metrics, constraint, &cli.output).map_err(|err| err.to_string())?;
    println!("{}", report.best_model_id);
    Ok(())
}
