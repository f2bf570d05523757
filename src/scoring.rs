//! Online scoring for a registered model.
//!
//! [`ScoringContext::init`] runs once per process and owns everything a request
//! needs; [`ScoringContext::run`] never mutates it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::ml::gbdt_stump::{GbdtStumpModel, ModelError, argmax};

/// Environment variable pointing at `<registry>/<name>/<version>`.
pub const MODEL_DIR_ENV_VAR: &str = "AZUREML_MODEL_DIR";

/// Request fields, in the order the model consumes them.
pub const FEATURE_ORDER: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Display names used for a two-class model when none are configured.
pub const DEFAULT_CLASS_LABELS: [&str; 2] = ["No Diabetes", "Diabetes"];

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("AZUREML_MODEL_DIR is not set")]
    MissingModelDir,
    #[error("Model directory {0} does not end in <name>/<version>")]
    InvalidModelDir(PathBuf),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Model has {model} classes but {labels} class labels were configured")]
    ClassLabelMismatch { model: usize, labels: usize },
    #[error("Model feature '{0}' is not a request field")]
    UnknownFeature(String),
}

/// Per-request failures, reported to the caller as `{"error": ...}`.
#[derive(Debug, Error)]
enum RequestError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Missing input field: '{0}'")]
    MissingField(String),
    #[error("could not convert string to float: '{0}'")]
    NotNumeric(String),
}

#[derive(Debug, Serialize)]
struct ScoreResponse<'a> {
    predicted_class: &'a str,
    probability: f64,
    model_name: &'a str,
    model_version: &'a str,
}

/// Loaded model plus identity, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    model: GbdtStumpModel,
    model_name: String,
    model_version: String,
    class_labels: Vec<String>,
    /// Request field index for each model feature, in model column order.
    feature_slots: Vec<usize>,
}

impl ScoringContext {
    /// Build the context from `AZUREML_MODEL_DIR`.
    pub fn init(class_labels: &[String]) -> Result<Self, ScoringError> {
        let dir = std::env::var_os(MODEL_DIR_ENV_VAR).ok_or(ScoringError::MissingModelDir)?;
        Self::from_model_dir(Path::new(&dir), class_labels)
    }

    /// Build the context from a registered version directory.
    ///
    /// The last two path segments name the model and its version; the model is
    /// read from `<dir>/model/model.json`. An empty `class_labels` picks the
    /// defaults for the model's class count.
    pub fn from_model_dir(dir: &Path, class_labels: &[String]) -> Result<Self, ScoringError> {
        let mut segments = dir
            .components()
            .rev()
            .filter_map(|c| match c {
                std::path::Component::Normal(name) => name.to_str(),
                _ => None,
            });
        let invalid = || ScoringError::InvalidModelDir(dir.to_path_buf());
        let model_version = segments.next().ok_or_else(invalid)?.to_string();
        let model_name = segments.next().ok_or_else(invalid)?.to_string();

        let model = GbdtStumpModel::load_json(&dir.join("model"))?;
        let class_labels = resolve_class_labels(&model, class_labels)?;
        let feature_slots = feature_slots(&model)?;
        tracing::info!(
            "Scoring model {model_name} version {model_version} with {} classes",
            model.classes.len()
        );
        Ok(Self {
            model,
            model_name,
            model_version,
            class_labels,
            feature_slots,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Score one raw JSON request; failures come back as `{"error": ...}`.
    pub fn run(&self, raw: &str) -> String {
        match self.score(raw) {
            Ok(body) => body,
            Err(err) => json!({ "error": err.to_string() }).to_string(),
        }
    }

    fn score(&self, raw: &str) -> Result<String, RequestError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(fields) = value else {
            return Err(RequestError::NotAnObject);
        };
        let features = extract_features(&fields)?;
        let by_name = self.align(&features);
        let proba = self.model.predict_proba(&by_name);
        let class_idx = argmax(&proba);
        let response = ScoreResponse {
            predicted_class: &self.class_labels[class_idx],
            probability: proba[class_idx] as f64,
            model_name: &self.model_name,
            model_version: &self.model_version,
        };
        Ok(serde_json::to_string(&response)?)
    }

    /// Reorder request features into the model's own column order.
    fn align(&self, features: &[f32]) -> Vec<f32> {
        self.feature_slots.iter().map(|&slot| features[slot]).collect()
    }
}

fn feature_slots(model: &GbdtStumpModel) -> Result<Vec<usize>, ScoringError> {
    model
        .feature_names
        .iter()
        .map(|name| {
            FEATURE_ORDER
                .iter()
                .position(|field| field == name)
                .ok_or_else(|| ScoringError::UnknownFeature(name.clone()))
        })
        .collect()
}

fn resolve_class_labels(
    model: &GbdtStumpModel,
    configured: &[String],
) -> Result<Vec<String>, ScoringError> {
    if !configured.is_empty() {
        if configured.len() != model.classes.len() {
            return Err(ScoringError::ClassLabelMismatch {
                model: model.classes.len(),
                labels: configured.len(),
            });
        }
        return Ok(configured.to_vec());
    }
    if model.classes.len() == DEFAULT_CLASS_LABELS.len() {
        return Ok(DEFAULT_CLASS_LABELS.iter().map(|s| s.to_string()).collect());
    }
    Ok(model.classes.clone())
}

fn extract_features(fields: &Map<String, Value>) -> Result<Vec<f32>, RequestError> {
    FEATURE_ORDER
        .iter()
        .map(|&name| {
            let value = fields
                .get(name)
                .ok_or_else(|| RequestError::MissingField(name.to_string()))?;
            numeric(value).map(|v| v as f32)
        })
        .collect()
}

fn numeric(value: &Value) -> Result<f64, RequestError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| RequestError::NotNumeric(number.to_string())),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| RequestError::NotNumeric(text.clone())),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        other => Err(RequestError::NotNumeric(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::gbdt_stump::{MODEL_FORMAT_VERSION, Stump};
    use tempfile::tempdir;

    /// Predicts "Diabetes" when Glucose > 100.
    fn glucose_model() -> GbdtStumpModel {
        GbdtStumpModel {
            format_version: MODEL_FORMAT_VERSION,
            feature_names: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            label_column: "Outcome".into(),
            classes: vec!["0".into(), "1".into()],
            learning_rate: 1.0,
            init_raw: vec![0.0, 0.0],
            stumps: vec![vec![
                Stump {
                    feature_index: 1,
                    threshold: 100.0,
                    left_value: 1.0,
                    right_value: -1.0,
                },
                Stump {
                    feature_index: 1,
                    threshold: 100.0,
                    left_value: -1.0,
                    right_value: 1.0,
                },
            ]],
        }
    }

    fn context() -> (tempfile::TempDir, ScoringContext) {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("azureml-models").join("diabetes_model").join("1");
        glucose_model()
            .save_json(&model_dir.join("model").join("model.json"))
            .unwrap();
        let ctx = ScoringContext::from_model_dir(&model_dir, &[]).unwrap();
        (dir, ctx)
    }

    fn payload() -> Value {
        json!({
            "Pregnancies": 2,
            "Glucose": 120,
            "BloodPressure": 70,
            "SkinThickness": 20,
            "Insulin": 85,
            "BMI": 25.0,
            "DiabetesPedigreeFunction": 0.5,
            "Age": 30
        })
    }

    #[test]
    fn identity_comes_from_the_directory() {
        let (_dir, ctx) = context();
        assert_eq!(ctx.model_name(), "diabetes_model");
        assert_eq!(ctx.model_version(), "1");
    }

    #[test]
    fn complete_payload_returns_exactly_four_fields() {
        let (_dir, ctx) = context();
        let mut request = payload();
        request["UnexpectedField"] = json!(999);
        let response: Map<String, Value> =
            serde_json::from_str(&ctx.run(&request.to_string())).unwrap();
        let keys: Vec<&str> = response.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["predicted_class", "probability", "model_name", "model_version"]
        );
        assert_eq!(response["predicted_class"], "Diabetes");
        assert_eq!(response["model_name"], "diabetes_model");
        assert_eq!(response["model_version"], "1");
        let probability = response["probability"].as_f64().unwrap();
        assert!(probability > 0.5 && probability <= 1.0);
    }

    #[test]
    fn missing_field_names_the_key() {
        let (_dir, ctx) = context();
        let mut request = payload();
        request.as_object_mut().unwrap().shift_remove("Age");
        let response: Value = serde_json::from_str(&ctx.run(&request.to_string())).unwrap();
        assert_eq!(response["error"], "Missing input field: 'Age'");

        let response: Value = serde_json::from_str(&ctx.run("{}")).unwrap();
        assert!(response["error"].as_str().unwrap().contains("Missing input field"));
    }

    #[test]
    fn bad_values_and_bad_json_are_errors() {
        let (_dir, ctx) = context();
        let mut request = payload();
        request["Pregnancies"] = json!("two");
        let response: Value = serde_json::from_str(&ctx.run(&request.to_string())).unwrap();
        assert_eq!(
            response["error"],
            "could not convert string to float: 'two'"
        );

        let response: Value =
            serde_json::from_str(&ctx.run("{'Pregnancies': 2, 'Glucose': 120}")).unwrap();
        assert!(response.get("error").is_some());
    }

    #[test]
    fn model_with_unmapped_features_is_rejected() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("m").join("1");
        let mut model = glucose_model();
        model.feature_names[0] = "x".to_string();
        model
            .save_json(&model_dir.join("model").join("model.json"))
            .unwrap();
        let err = ScoringContext::from_model_dir(&model_dir, &[]).unwrap_err();
        assert!(matches!(err, ScoringError::UnknownFeature(ref name) if name == "x"));
    }

    #[test]
    fn features_follow_the_model_column_order() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("m").join("1");
        let mut model = glucose_model();
        model.feature_names.swap(0, 1);
        model.stumps[0][0].feature_index = 0;
        model.stumps[0][1].feature_index = 0;
        model
            .save_json(&model_dir.join("model").join("model.json"))
            .unwrap();
        let ctx = ScoringContext::from_model_dir(&model_dir, &[]).unwrap();
        let response: Value = serde_json::from_str(&ctx.run(&payload().to_string())).unwrap();
        assert_eq!(response["predicted_class"], "Diabetes");
    }

    #[test]
    fn directory_without_two_segments_is_rejected() {
        let err = ScoringContext::from_model_dir(Path::new("/"), &[]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidModelDir(_)));
    }
}
