//! Serve scoring requests for a registered model over stdin/stdout.
//!
//! The model directory comes from `AZUREML_MODEL_DIR` unless `--model-dir` is
//! given. Each stdin line is one JSON request and yields one response line.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use mlstage::config::PipelineConfig;
use mlstage::logging;
use mlstage::scoring::ScoringContext;

#[derive(Debug, Parser)]
#[command(name = "mlstage-score", about = "Score JSON requests against a registered model")]
struct Cli {
    /// Registered version directory, `<registry>/<name>/<version>`.
    #[arg(long)]
    model_dir: Option<PathBuf>,
    /// Score the single request in this file instead of reading stdin.
    #[arg(long)]
    request: Option<PathBuf>,
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
    if let Err(err) = logging::init("mlstage-score") {
        eprintln!("Logging disabled: {err}");
    }
    let config =
        PipelineConfig::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let labels = &config.score.class_labels;
    let context = match &cli.model_dir {
        Some(dir) => ScoringContext::from_model_dir(dir, labels),
        None => ScoringContext::init(labels),
    }
    .map_err(|err| err.to_string())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Some(path) = &cli.request {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
        writeln!(out, "{}", context.run(&raw)).map_err(|err| err.to_string())?;
        return Ok(());
    }
    for line in std::io::stdin().lock().lines() {
        let line = line.map_err(|err| err.to_string())?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(out, "{}", context.run(&line)).map_err(|err| err.to_string())?;
        out.flush().map_err(|err| err.to_string())?;
    }
    Ok(())
}
