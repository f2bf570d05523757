//! Evaluate a trained model on held-out data and write its metrics record.

use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::logging;
use mlstage::stages::evaluate::{EvaluateRequest, run_evaluation};

#[derive(Debug, Parser)]
#[command(name = "mlstage-eval", about = "Evaluate a model and write metrics JSON")]
struct Cli {
    /// Model file or directory containing model.json.
    #[arg(long)]
    model_path: PathBuf,
    /// CSV file or directory of CSV files.
    #[arg(long)]
    test_data: PathBuf,
    #[arg(long)]
    model_id: String,
    /// Metrics JSON destination.
    #[arg(long)]
    output: PathBuf,
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    positive_label: Option<String>,
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
    if let Err(err) = logging::init("mlstage-eval") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let request = EvaluateRequest {
        model_id: cli.model_id,
        model_path: cli.model_path,
        test_data: cli.test_data,
        label_column: cli.label.unwrap_or(config.evaluate.label),
        positive_label: cli.positive_label.unwrap_or(config.evaluate.positive_label),
    };
    let record = run_evaluation(&request, &cli.output).map_err(|err| err.to_string())?;
    println!(
        "accuracy={:.4}  precision={:.4}  recall={:.4}  f1={:.4}",
        record.accuracy, record.precision, record.recall, record.f1_score
    );
    Ok(())
}
