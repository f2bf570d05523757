//! Split a CSV dataset into seeded train and test partitions.

use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::dataset::split::split_dataset;
use mlstage::logging;

#[derive(Debug, Parser)]
#[command(name = "mlstage-split", about = "Split a dataset into train and test CSV files")]
struct Cli {
    /// CSV file or directory of CSV files.
    #[arg(long)]
    input: PathBuf,
    /// Directory receiving train_data.csv.
    #[arg(long)]
    train_output: PathBuf,
    /// Directory receiving test_data.csv.
    #[arg(long)]
    test_output: PathBuf,
    /// Fraction of rows assigned to training.
    #[arg(long)]
    ratio: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
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
    if let Err(err) = logging::init("mlstage-split") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let mut options = config.split.options();
    if let Some(ratio) = cli.ratio {
        options.ratio = ratio;
    }
    if let Some(seed) = cli.seed {
        options.seed = seed;
    }
    let outputs = split_dataset(&cli.input, &cli.train_output, &cli.test_output, &options)
        .map_err(|err| err.to_string())?;
    println!(
        "train rows: {}  test rows: {}",
        outputs.train_rows, outputs.test_rows
    );
    Ok(())
}
