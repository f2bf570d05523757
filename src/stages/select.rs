//! Pick the winning model from a set of metrics records.
//!
//! Records are kept as raw JSON objects so the report reproduces each input
//! exactly, including fields this crate does not know about. Only the field
//! the active constraint needs, plus the identifier, is required.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::output::{self, OutputError};

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("Metrics file not found: {path}")]
    NotFound { path: PathBuf },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid metrics JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Metrics record in {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("Metrics record in {path} has no numeric '{field}' field")]
    Schema { path: PathBuf, field: String },
    #[error("No metrics records to compare")]
    NoRecords,
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Selection criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    MinimizeFp,
    MinimizeFn,
    MaximizeF1,
}

impl Constraint {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "minimize_fp" => Some(Self::MinimizeFp),
            "minimize_fn" => Some(Self::MinimizeFn),
            "maximize_f1" => Some(Self::MaximizeF1),
            _ => None,
        }
    }

    /// Parse a constraint name; anything unrecognized selects by F1.
    pub fn parse_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!("Unknown constraint '{name}', falling back to maximize_f1");
            Self::MaximizeF1
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MinimizeFp => "minimize_fp",
            Self::MinimizeFn => "minimize_fn",
            Self::MaximizeF1 => "maximize_f1",
        }
    }

    /// Metrics field the constraint ranks by.
    pub fn field(self) -> &'static str {
        match self {
            Self::MinimizeFp => "fpr",
            Self::MinimizeFn => "fnr",
            Self::MaximizeF1 => "f1_score",
        }
    }

    /// Strictly better; equal values keep the incumbent.
    fn beats(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::MinimizeFp | Self::MinimizeFn => candidate < incumbent,
            Self::MaximizeF1 => candidate > incumbent,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metrics file as read from disk.
#[derive(Debug, Clone)]
pub struct LoadedRecord {
    pub path: PathBuf,
    pub fields: Map<String, Value>,
}

impl LoadedRecord {
    /// `model_id`, or the legacy `model_name[:model_version]` pair.
    pub fn model_id(&self) -> Option<String> {
        if let Some(id) = self.fields.get("model_id") {
            return value_text(id);
        }
        let name = self.fields.get("model_name").and_then(value_text)?;
        match self.fields.get("model_version").and_then(value_text) {
            Some(version) => Some(format!("{name}:{version}")),
            None => Some(name),
        }
    }

    fn metric(&self, field: &str) -> Result<f64, SelectError> {
        self.fields
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.schema_error(field))
    }

    fn schema_error(&self, field: &str) -> SelectError {
        SelectError::Schema {
            path: self.path.clone(),
            field: field.to_string(),
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Selection output consumed by the registrar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    #[serde(default)]
    pub models: Vec<Map<String, Value>>,
    #[serde(alias = "best_model")]
    pub best_model_id: String,
}

impl ComparisonReport {
    pub fn load(path: &Path) -> Result<Self, SelectError> {
        let bytes = std::fs::read(path).map_err(|source| SelectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SelectError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Expand directories into their `*.json` files (sorted by name); files pass through.
pub fn metrics_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, SelectError> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files = std::fs::read_dir(path)
                .map_err(|source| SelectError::Read {
                    path: path.clone(),
                    source,
                })?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.is_file())
                .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
                .collect::<Vec<_>>();
            files.sort();
            out.extend(files);
        } else if path.is_file() {
            out.push(path.clone());
        } else {
            return Err(SelectError::NotFound { path: path.clone() });
        }
    }
    Ok(out)
}

pub fn load_record(path: &Path) -> Result<LoadedRecord, SelectError> {
    if !path.exists() {
        return Err(SelectError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| SelectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| SelectError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(fields) => Ok(LoadedRecord {
            path: path.to_path_buf(),
            fields,
        }),
        _ => Err(SelectError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Return the identifier of the best record under `constraint`.
///
/// Every record must carry the ranked field and an identifier. The first
/// record reaching the extreme value wins.
pub fn select_best(
    records: &[LoadedRecord],
    constraint: Constraint,
) -> Result<String, SelectError> {
    let field = constraint.field();
    let mut best: Option<(f64, String)> = None;
    for record in records {
        let value = record.metric(field)?;
        let id = record
            .model_id()
            .ok_or_else(|| record.schema_error("model_id"))?;
        let replace = match &best {
            None => true,
            Some((incumbent, _)) => constraint.beats(value, *incumbent),
        };
        if replace {
            best = Some((value, id));
        }
    }
    best.map(|(_, id)| id).ok_or(SelectError::NoRecords)
}

/// Read every metrics file, pick the winner and write the comparison report.
pub fn compare_models(
    metrics_paths: &[PathBuf],
    constraint: Constraint,
    output_path: &Path,
) -> Result<ComparisonReport, SelectError> {
    let files = metrics_inputs(metrics_paths)?;
    let records = files
        .iter()
        .map(|path| load_record(path))
        .collect::<Result<Vec<_>, _>>()?;
    let best_model_id = select_best(&records, constraint)?;
    tracing::info!(
        constraint = %constraint,
        candidates = records.len(),
        "Best model: {best_model_id}"
    );

    let report = ComparisonReport {
        models: records.into_iter().map(|record| record.fields).collect(),
        best_model_id,
    };
    output::write_json(output_path, &report)?;
    tracing::info!("Comparison report saved at {}", output_path.display());
    Ok(report)
}
