//! Register the trained model only when selection picked it.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::output::{self, OutputError};
use super::select::{ComparisonReport, SelectError};
use crate::ml::gbdt_stump::{GbdtStumpModel, ModelError};
use crate::registry::{ModelRegistry, RegistryError};

pub const REPORT_NOT_FOUND: &str = "Comparison report not found.";
pub const EXISTING_MODEL_BETTER: &str = "Existing model is better than trained model.";
pub const TRAINED_MODEL_BEST: &str = "Trained model is the best model.";
pub const REGISTRATION_ABORTED: &str = "Model registration aborted.";
pub const REGISTRATION_COMPLETE: &str = "Model registration complete.";

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Report(#[from] SelectError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Inputs of one registration run.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub comparison_report: PathBuf,
    pub model_path: PathBuf,
    pub model_name: String,
    pub model_id: String,
}

/// How a registration run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    ReportMissing,
    NotBest { best_model_id: String },
    Registered { version: u32 },
}

/// Ordered human-readable log of a registration run.
#[derive(Debug, Default)]
pub struct RegisterLog {
    lines: Vec<String>,
}

impl RegisterLog {
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contents(&self) -> String {
        self.lines.join("\n")
    }
}

/// Decide and, when the candidate won, register it. Lines go to `log`.
pub fn register_if_best(
    request: &RegisterRequest,
    registry: &mut dyn ModelRegistry,
    log: &mut RegisterLog,
) -> Result<RegisterOutcome, RegisterError> {
    if !request.comparison_report.is_file() {
        log.push(REPORT_NOT_FOUND);
        log.push(REGISTRATION_ABORTED);
        return Ok(RegisterOutcome::ReportMissing);
    }
    let report = ComparisonReport::load(&request.comparison_report)?;
    if report.best_model_id != request.model_id {
        log.push(format!(
            "Best model is '{}', trained model is '{}'.",
            report.best_model_id, request.model_id
        ));
        log.push(EXISTING_MODEL_BETTER);
        log.push(REGISTRATION_ABORTED);
        return Ok(RegisterOutcome::NotBest {
            best_model_id: report.best_model_id,
        });
    }

    log.push(TRAINED_MODEL_BEST);
    let model = GbdtStumpModel::load_json(&request.model_path)?;
    let version = registry.register(&request.model_name, &model)?;
    log.push(format!(
        "Registered model {} version {version}.",
        request.model_name
    ));
    log.push(REGISTRATION_COMPLETE);
    Ok(RegisterOutcome::Registered { version })
}

/// Run the registration gate and flush the log to `log_path` whatever happens.
///
/// When registration succeeds and `version_output` is set, the new version is
/// published there as well.
pub fn run_registration(
    request: &RegisterRequest,
    registry: &mut dyn ModelRegistry,
    log_path: &Path,
    version_output: Option<&Path>,
) -> Result<RegisterOutcome, RegisterError> {
    let mut log = RegisterLog::default();
    let result = register_if_best(request, registry, &mut log);
    if let Err(err) = &result {
        log.push(format!("Model registration failed: {err}"));
    }
    output::set_output(log_path, &log.contents())?;
    let outcome = result?;
    if let (RegisterOutcome::Registered { version }, Some(path)) = (&outcome, version_output) {
        output::set_output(path, &version.to_string())?;
    }
    Ok(outcome)
}
