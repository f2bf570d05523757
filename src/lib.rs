//! Library exports shared by the stage binaries, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// Optional TOML pipeline configuration.
pub mod config;
/// CSV tables, splitting and feature transforms.
pub mod dataset;
/// Logging setup.
pub mod logging;
/// Classifier, labels and metrics.
pub mod ml;
/// Versioned model storage.
pub mod registry;
/// Online scoring for registered models.
pub mod scoring;
/// Evaluation, selection and registration stages.
pub mod stages;
