use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of a serialized model inside an artifact directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// Current artifact format version.
pub const MODEL_FORMAT_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model artifact not found at {path}")]
    NotFound { path: PathBuf },
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid model: {0}")]
    Invalid(String),
    #[error("Failed to serialize model: {0}")]
    Serialize(serde_json::Error),
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Single-node decision tree used as a weak learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stump {
    /// Feature index used for the split.
    pub feature_index: u16,
    /// Threshold in feature units.
    pub threshold: f32,
    /// Prediction for `feature <= threshold`.
    pub left_value: f32,
    /// Prediction for `feature > threshold`.
    pub right_value: f32,
}

impl Stump {
    /// Predict the stump value for a feature vector.
    pub fn predict(&self, features: &[f32]) -> f32 {
        let idx = self.feature_index as usize;
        let value = features.get(idx).copied().unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Gradient-boosted decision stump classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtStumpModel {
    /// Artifact format version.
    pub format_version: i64,
    /// Feature column names, in the order rows must be presented.
    pub feature_names: Vec<String>,
    /// Column the model was trained to predict.
    pub label_column: String,
    /// Ordered list of normalized class labels.
    pub classes: Vec<String>,
    /// Learning rate applied to each stump prediction.
    pub learning_rate: f32,
    /// Initial raw logits before boosting rounds.
    pub init_raw: Vec<f32>,
    /// Shape: `[n_rounds][n_classes]`.
    pub stumps: Vec<Vec<Stump>>,
}

impl GbdtStumpModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::Invalid(format!(
                "Unsupported format_version {} (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.classes.len() < 2 {
            return Err(ModelError::Invalid(
                "Model must contain at least 2 classes".to_string(),
            ));
        }
        if self.init_raw.len() != self.classes.len() {
            return Err(ModelError::Invalid(
                "init_raw length must match classes length".to_string(),
            ));
        }
        for (round_idx, round) in self.stumps.iter().enumerate() {
            if round.len() != self.classes.len() {
                return Err(ModelError::Invalid(format!(
                    "Round {round_idx} has {} stumps but expected {}",
                    round.len(),
                    self.classes.len()
                )));
            }
            if let Some(stump) = round
                .iter()
                .find(|stump| stump.feature_index as usize >= self.feature_names.len())
            {
                return Err(ModelError::Invalid(format!(
                    "Round {round_idx} splits on feature {} but only {} features exist",
                    stump.feature_index,
                    self.feature_names.len()
                )));
            }
        }
        Ok(())
    }

    /// Load a model from a JSON file or an artifact directory.
    pub fn load_json(path: &Path) -> Result<Self, ModelError> {
        let path = resolve_artifact(path)?;
        let bytes = std::fs::read(&path).map_err(|source| ModelError::Read {
            path: path.clone(),
            source,
        })?;
        let model: Self =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse { path, source })?;
        model.validate()?;
        Ok(model)
    }

    /// Write the model as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), ModelError> {
        let write_err = |source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(ModelError::Serialize)?;
        std::fs::write(path, bytes).map_err(write_err)
    }

    /// Predict raw logits for a feature vector.
    pub fn predict_raw(&self, features: &[f32]) -> Vec<f32> {
        let mut raw = self.init_raw.clone();
        for round in &self.stumps {
            for (class_idx, stump) in round.iter().enumerate() {
                raw[class_idx] += self.learning_rate * stump.predict(features);
            }
        }
        raw
    }

    /// Predict class probabilities for a feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        softmax(&self.predict_raw(features))
    }

    /// Predict the best class index for a feature vector.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_raw(features))
    }

    /// Predict the class label for each row.
    pub fn predict_labels(&self, rows: &[Vec<f32>]) -> Vec<&str> {
        rows.iter()
            .map(|row| self.classes[self.predict_class_index(row)].as_str())
            .collect()
    }
}

/// Resolve a model path: a file is used as-is; a directory must contain
/// `model.json` or `model/model.json`.
pub fn resolve_artifact(path: &Path) -> Result<PathBuf, ModelError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        let candidates = [
            path.join(MODEL_FILE_NAME),
            path.join("model").join(MODEL_FILE_NAME),
        ];
        if let Some(found) = candidates.into_iter().find(|candidate| candidate.is_file()) {
            return Ok(found);
        }
    }
    Err(ModelError::NotFound {
        path: path.to_path_buf(),
    })
}

/// Compute a numerically-stable softmax for a set of logits.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
pub(crate) fn two_class_model() -> GbdtStumpModel {
    GbdtStumpModel {
        format_version: MODEL_FORMAT_VERSION,
        feature_names: vec!["x".into(), "y".into()],
        label_column: "label".into(),
        classes: vec!["0".into(), "1".into()],
        learning_rate: 1.0,
        init_raw: vec![0.0, 0.0],
        stumps: vec![vec![
            Stump {
                feature_index: 0,
                threshold: 0.0,
                left_value: 1.0,
                right_value: -1.0,
            },
            Stump {
                feature_index: 0,
                threshold: 0.0,
                left_value: -1.0,
                right_value: 1.0,
            },
        ]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stump_predict_branches() {
        let stump = Stump {
            feature_index: 0,
            threshold: 0.5,
            left_value: -1.0,
            right_value: 2.0,
        };
        assert_eq!(stump.predict(&[0.0]), -1.0);
        assert_eq!(stump.predict(&[0.5]), -1.0);
        assert_eq!(stump.predict(&[0.6]), 2.0);
    }

    #[test]
    fn model_predicts_labels() {
        let model = two_class_model();
        assert_eq!(model.predict_class_index(&[0.0, 0.0]), 0);
        assert_eq!(
            model.predict_labels(&[vec![-3.0, 0.0], vec![1.0, 0.0]]),
            vec!["0", "1"]
        );
        let proba = model.predict_proba(&[1.0, 0.0]);
        assert!((proba.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(proba[1] > proba[0]);
    }

    #[test]
    fn validate_rejects_out_of_range_feature() {
        let mut model = two_class_model();
        model.stumps[0][1].feature_index = 5;
        assert!(matches!(model.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn directory_artifacts_resolve_to_model_json() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("model").join(MODEL_FILE_NAME);
        two_class_model().save_json(&nested).unwrap();
        let loaded = GbdtStumpModel::load_json(dir.path()).unwrap();
        assert_eq!(loaded.classes, vec!["0", "1"]);
        assert!(matches!(
            GbdtStumpModel::load_json(&dir.path().join("absent")),
            Err(ModelError::NotFound { .. })
        ));
    }
}
