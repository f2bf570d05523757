//! Score one trained model against held-out data.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::output::{self, OutputError};
use crate::dataset::{self, TableError};
use crate::ml::gbdt_stump::GbdtStumpModel;
use crate::ml::labels::normalize_label;
use crate::ml::metrics::{MetricsRecord, binary_rates, confusion_for_labels};

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("Test data at {path} has no rows")]
    Empty { path: PathBuf },
}

/// Inputs of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    pub model_id: String,
    pub model_path: PathBuf,
    pub test_data: PathBuf,
    pub label_column: String,
    pub positive_label: String,
}

/// Compute the metrics record for `request`.
///
/// A model that cannot be loaded yields [`MetricsRecord::zero`] so selection
/// can still run; test data problems are errors.
pub fn evaluate_model(request: &EvaluateRequest) -> Result<MetricsRecord, EvaluateError> {
    let table = dataset::load_tables(&request.test_data)?;
    if table.is_empty() {
        return Err(EvaluateError::Empty {
            path: request.test_data.clone(),
        });
    }
    let truth: Vec<String> = table
        .column(&request.label_column)?
        .into_iter()
        .map(normalize_label)
        .collect();

    let model = match GbdtStumpModel::load_json(&request.model_path) {
        Ok(model) => model,
        Err(err) => {
            tracing::warn!("Model unavailable, emitting zero metrics: {err}");
            return Ok(MetricsRecord::zero());
        }
    };

    let rows = table.feature_matrix(&model.feature_names)?;
    let predicted = model.predict_labels(&rows);
    let (cm, classes) = confusion_for_labels(&truth, &predicted);
    let positive = normalize_label(&request.positive_label);
    let (accuracy, precision, recall) = binary_rates(&cm, &classes, &positive);

    for (truth_idx, truth_class) in classes.iter().enumerate() {
        let row: Vec<u32> = (0..cm.n_classes).map(|pred| cm.get(truth_idx, pred)).collect();
        tracing::debug!("confusion truth={truth_class} predicted={row:?}");
    }

    Ok(MetricsRecord::from_rates(
        &request.model_id,
        accuracy,
        precision,
        recall,
    ))
}

/// Evaluate and write the record to `output_path` as pretty JSON.
pub fn run_evaluation(
    request: &EvaluateRequest,
    output_path: &Path,
) -> Result<MetricsRecord, EvaluateError> {
    let record = evaluate_model(request)?;
    output::write_json(output_path, &record)?;
    tracing::info!(
        model_id = %record.model_id,
        accuracy = record.accuracy,
        precision = record.precision,
        recall = record.recall,
        f1_score = record.f1_score,
        "Evaluation results saved to {}",
        output_path.display()
    );
    Ok(record)
}
