//! Apply the configured column transforms to a dataset.

use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::dataset::features::engineer_features;
use mlstage::logging;

#[derive(Debug, Parser)]
#[command(name = "mlstage-features", about = "Transform dataset columns")]
struct Cli {
    /// CSV file or directory of CSV files.
    #[arg(long)]
    dataset: PathBuf,
    /// Directory receiving transformed_data.csv.
    #[arg(long)]
    output: PathBuf,
    /// TOML file with a `[features]` column list.
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
    if let Err(err) = logging::init("mlstage-features") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let path = engineer_features(&cli.dataset, &cli.output, &config.features.columns)
        .map_err(|err| err.to_string())?;
    println!("{}", path.display());
    Ok(())
}
