//! Optional TOML configuration shared by the stage binaries.
//!
//! Every section is optional and falls back to defaults; command-line flags
//! override whatever the file provides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::features::{ColumnSpec, default_columns};
use crate::dataset::split::SplitOptions;
use crate::ml::gbdt_stump::TrainOptions;

/// Outcome column of the default diabetes layout.
pub const DEFAULT_LABEL: &str = "Outcome";

/// Registered name used when neither the config nor the command line sets one.
pub const DEFAULT_MODEL_NAME: &str = "diabetes_model";

/// Errors that may occur while loading a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub split: SplitSection,
    pub features: FeaturesSection,
    pub train: TrainSection,
    pub evaluate: EvaluateSection,
    pub select: SelectSection,
    pub register: RegisterSection,
    pub score: ScoreSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSection {
    pub ratio: f64,
    pub seed: u64,
}

impl Default for SplitSection {
    fn default() -> Self {
        let defaults = SplitOptions::default();
        Self {
            ratio: defaults.ratio,
            seed: defaults.seed,
        }
    }
}

impl SplitSection {
    pub fn options(&self) -> SplitOptions {
        SplitOptions {
            ratio: self.ratio,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesSection {
    pub columns: Vec<ColumnSpec>,
}

impl Default for FeaturesSection {
    fn default() -> Self {
        Self {
            columns: default_columns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainSection {
    pub label: String,
    pub rounds: usize,
    pub learning_rate: f32,
    pub bins: usize,
}

impl Default for TrainSection {
    fn default() -> Self {
        let defaults = TrainOptions::default();
        Self {
            label: DEFAULT_LABEL.to_string(),
            rounds: defaults.rounds,
            learning_rate: defaults.learning_rate,
            bins: defaults.bins,
        }
    }
}

impl TrainSection {
    pub fn options(&self) -> TrainOptions {
        TrainOptions {
            rounds: self.rounds,
            learning_rate: self.learning_rate,
            bins: self.bins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateSection {
    pub label: String,
    pub positive_label: String,
}

impl Default for EvaluateSection {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            positive_label: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectSection {
    pub constraint: String,
}

impl Default for SelectSection {
    fn default() -> Self {
        Self {
            constraint: "maximize_f1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterSection {
    pub model_name: String,
}

impl Default for RegisterSection {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSection {
    /// Display names indexed by class position; empty means "use defaults".
    pub class_labels: Vec<String>,
}

impl PipelineConfig {
    /// Load `path` if given, otherwise return defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }
}
