//! Versioned model storage.
//!
//! Layout: `<root>/<name>/<version>/model/model.json`, versions counting up from
//! 1. The `<root>/<name>/<version>` directory is what the scoring endpoint is
//! pointed at through `AZUREML_MODEL_DIR`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ml::gbdt_stump::{GbdtStumpModel, MODEL_FILE_NAME, ModelError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registered model name '{0}'")]
    InvalidName(String),
    #[error("Failed to read registry directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No version number left for registered model '{0}'")]
    VersionOverflow(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Where registered models go.
pub trait ModelRegistry {
    /// Store `model` as the next version of `name` and return that version.
    fn register(&mut self, name: &str, model: &GbdtStumpModel) -> Result<u32, RegistryError>;
}

/// Registry backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsModelRegistry {
    root: PathBuf,
}

impl FsModelRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one registered version.
    pub fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.root.join(name).join(version.to_string())
    }

    /// Highest registered version of `name`, if any.
    pub fn latest_version(&self, name: &str) -> Result<Option<u32>, RegistryError> {
        validate_name(name)?;
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(None);
        }
        let versions = std::fs::read_dir(&dir)
            .map_err(|source| RegistryError::ReadDir {
                path: dir.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok());
        Ok(versions.max())
    }

    /// Load a registered version back.
    pub fn load(&self, name: &str, version: u32) -> Result<GbdtStumpModel, RegistryError> {
        validate_name(name)?;
        Ok(GbdtStumpModel::load_json(&self.version_dir(name, version))?)
    }
}

impl ModelRegistry for FsModelRegistry {
    fn register(&mut self, name: &str, model: &GbdtStumpModel) -> Result<u32, RegistryError> {
        let version = self
            .latest_version(name)?
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| RegistryError::VersionOverflow(name.to_string()))?;
        let path = self
            .version_dir(name, version)
            .join("model")
            .join(MODEL_FILE_NAME);
        model.save_json(&path)?;
        tracing::info!("Registered {name} version {version} at {}", path.display());
        Ok(version)
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && name.chars().all(|c| !c.is_control());
    if ok {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}
