//! Machine learning building blocks: the classifier, label handling and metrics.

pub mod gbdt_stump;
pub mod labels;
pub mod metrics;
