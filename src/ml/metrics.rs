//! Evaluation metrics for classification models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }
}

#[derive(Debug, Clone)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f32;
        let mut fp = 0f32;
        let mut fn_ = 0f32;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f32;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f32;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            precision,
            recall,
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let mut correct = 0u64;
    let mut total = 0u64;
    for truth in 0..cm.n_classes {
        for predicted in 0..cm.n_classes {
            let v = cm.get(truth, predicted) as u64;
            total += v;
            if truth == predicted {
                correct += v;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        (correct as f32) / (total as f32)
    }
}

/// One model's scores on a held-out set, as written by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub model_id: String,
    pub accuracy: f64,
    pub recall: f64,
    pub precision: f64,
    pub f1_score: f64,
    pub fpr: f64,
    pub fnr: f64,
}

impl MetricsRecord {
    /// Worst-case record emitted when the model under test cannot be loaded.
    pub fn zero() -> Self {
        Self {
            model_id: String::new(),
            accuracy: 0.0,
            recall: 0.0,
            precision: 0.0,
            f1_score: 0.0,
            fpr: 1.0,
            fnr: 1.0,
        }
    }

    /// Derive the record from accuracy, precision and recall.
    ///
    /// `f1_score` is the harmonic mean of accuracy (not precision) and recall.
    pub fn from_rates(model_id: &str, accuracy: f64, precision: f64, recall: f64) -> Self {
        let denom = accuracy + recall;
        let f1_score = if denom == 0.0 {
            0.0
        } else {
            2.0 * accuracy * recall / denom
        };
        Self {
            model_id: model_id.to_string(),
            accuracy,
            recall,
            precision,
            f1_score,
            fpr: 1.0 - precision,
            fnr: 1.0 - recall,
        }
    }
}

/// Confusion matrix over `truth ∪ predicted` labels plus the class order used.
pub fn confusion_for_labels(
    truth: &[String],
    predicted: &[&str],
) -> (ConfusionMatrix, Vec<String>) {
    let mut classes: Vec<String> = Vec::new();
    let pairs: Vec<(usize, usize)> = truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (class_slot(&mut classes, t), class_slot(&mut classes, p)))
        .collect();
    let mut cm = ConfusionMatrix::new(classes.len());
    for (t, p) in pairs {
        cm.add(t, p);
    }
    (cm, classes)
}

fn class_slot(classes: &mut Vec<String>, label: &str) -> usize {
    match classes.iter().position(|class| class == label) {
        Some(idx) => idx,
        None => {
            classes.push(label.to_string());
            classes.len() - 1
        }
    }
}

/// Binary accuracy/precision/recall for `positive`, in that order.
pub fn binary_rates(cm: &ConfusionMatrix, classes: &[String], positive: &str) -> (f64, f64, f64) {
    let acc = accuracy(cm) as f64;
    let per_class = precision_recall_by_class(cm);
    match classes.iter().position(|class| class == positive) {
        Some(idx) => (
            acc,
            per_class[idx].precision as f64,
            per_class[idx].recall as f64,
        ),
        None => (acc, 0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn perfect_predictions_score_one() {
        let truth = labels(&["0", "1", "1", "0"]);
        let (cm, classes) = confusion_for_labels(&truth, &["0", "1", "1", "0"]);
        let (acc, precision, recall) = binary_rates(&cm, &classes, "1");
        let record = MetricsRecord::from_rates("m", acc, precision, recall);
        assert_eq!(record.accuracy, 1.0);
        assert_eq!(record.precision, 1.0);
        assert_eq!(record.recall, 1.0);
        assert_eq!(record.f1_score, 1.0);
        assert_eq!(record.fpr, 0.0);
        assert_eq!(record.fnr, 0.0);
    }

    #[test]
    fn binary_rates_follow_positive_label() {
        let truth = labels(&["1", "1", "0", "0"]);
        let (cm, classes) = confusion_for_labels(&truth, &["1", "0", "1", "0"]);
        let (acc, precision, recall) = binary_rates(&cm, &classes, "1");
        assert_eq!(acc, 0.5);
        assert_eq!(precision, 0.5);
        assert_eq!(recall, 0.5);
    }

    #[test]
    fn f1_uses_accuracy_and_recall() {
        let record = MetricsRecord::from_rates("m", 0.8, 0.1, 0.4);
        assert!((record.f1_score - (2.0 * 0.8 * 0.4 / 1.2)).abs() < 1e-12);
        assert!((record.fpr - 0.9).abs() < 1e-12);
        assert!((record.fnr - 0.6).abs() < 1e-12);
    }

    #[test]
    fn absent_positive_and_zero_denominators() {
        let truth = labels(&["0", "0"]);
        let (cm, classes) = confusion_for_labels(&truth, &["0", "0"]);
        let (acc, precision, recall) = binary_rates(&cm, &classes, "1");
        assert_eq!((acc, precision, recall), (1.0, 0.0, 0.0));
        assert_eq!(MetricsRecord::from_rates("m", 0.0, 0.0, 0.0).f1_score, 0.0);
    }

    #[test]
    fn accuracy_counts_diagonal() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 0);
        cm.add(1, 0);
        cm.add(1, 1);
        cm.add(5, 0);
        assert!((accuracy(&cm) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(precision_recall_by_class(&cm)[1].support, 2);
    }
}
