//! Deterministic gradient-boosted decision-stump classifier.
//!
//! This is the pipeline's classifier. It avoids external ML dependencies while
//! still supporting:
//! - Binary and multi-class classification via softmax boosting.
//! - Column alignment by name (feature names travel with the artifact).
//! - Reproducible JSON model export/load.

mod model;
mod train;

pub use model::{
    GbdtStumpModel, MODEL_FILE_NAME, MODEL_FORMAT_VERSION, ModelError, Stump, argmax,
    resolve_artifact, softmax,
};
pub use train::{TrainDataset, TrainError, TrainOptions, train_gbdt_stump};

#[cfg(test)]
pub(crate) use model::two_class_model;
