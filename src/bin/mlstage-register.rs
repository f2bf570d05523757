//! Register the trained model when the comparison report names it the winner.

use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::logging;
use mlstage::registry::FsModelRegistry;
use mlstage::stages::register::{RegisterRequest, run_registration};

#[derive(Debug, Parser)]
#[command(name = "mlstage-register", about = "Register the model if it won selection")]
struct Cli {
    #[arg(long)]
    comparison_report: PathBuf,
    /// Model file or directory containing model.json.
    #[arg(long)]
    model_path: PathBuf,
    /// Registered model name.
    #[arg(long)]
    model_name: Option<String>,
    /// Identifier the trained model was evaluated under.
    #[arg(long)]
    model_id: String,
    /// Registration log destination.
    #[arg(long)]
    output: PathBuf,
    /// Root directory of the model registry.
    #[arg(long)]
    registry: PathBuf,
    /// File receiving the registered version number.
    #[arg(long)]
    model_version_output: Option<PathBuf>,
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
    if let Err(err) = logging::init("mlstage-register") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let request = RegisterRequest {
        comparison_report: cli.comparison_report,
        model_path: cli.model_path,
        model_name: cli.model_name.unwrap_or(config.register.model_name),
        model_id: cli.model_id,
    };
    let mut registry = FsModelRegistry::new(cli.registry);
    run_registration(
        &request,
        &mut registry,
        &cli.output,
        cli.model_version_output.as_deref(),
    )
    .map_err(|err| err.to_string())?;
    Ok(())
}
