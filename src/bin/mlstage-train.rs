//! Train a stump-GBDT classifier and write its JSON artifact.

use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::dataset;
use mlstage::logging;
use mlstage::ml::gbdt_stump::{MODEL_FILE_NAME, TrainDataset, train_gbdt_stump};

#[derive(Debug, Parser)]
#[command(name = "mlstage-train", about = "Train a gradient-boosted stump classifier")]
struct Cli {
    /// CSV file or directory of CSV files.
    #[arg(long)]
    training_data: PathBuf,
    /// Directory receiving model.json.
    #[arg(long)]
    model_output: PathBuf,
    #[arg(long)]
    label: Option<String>,
    /// Number of boosting rounds.
    #[arg(long)]
    rounds: Option<usize>,
    #[arg(long)]
    learning_rate: Option<f32>,
    #[arg(long)]
    bins: Option<usize>,
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
    if let Err(err) = logging::init("mlstage-train") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let label = cli.label.unwrap_or(config.train.label.clone());
    let mut options = config.train.options();
    if let Some(rounds) = cli.rounds {
        options.rounds = rounds;
    }
    if let Some(learning_rate) = cli.learning_rate {
        options.learning_rate = learning_rate;
    }
    if let Some(bins) = cli.bins {
        options.bins = bins;
    }

    let table = dataset::load_tables(&cli.training_data).map_err(|err| err.to_string())?;
    let train = TrainDataset::from_table(&table, &label).map_err(|err| err.to_string())?;
    tracing::info!(
        rows = train.x.len(),
        features = train.feature_names.len(),
        classes = train.classes.len(),
        "Training"
    );
    let model = train_gbdt_stump(&train, &options).map_err(|err| err.to_string())?;
    let path = cli.model_output.join(MODEL_FILE_NAME);
    model.save_json(&path).map_err(|err| err.to_string())?;
    tracing::info!("Model saved to {}", path.display());
    Ok(())
}
