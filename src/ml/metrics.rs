//! Evaluation metrics for the binary risk classifier.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::Classifier;
use crate::dataset::LabeledRecord;
use crate::patient::Outcome;

/// Accuracy is undefined over zero rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("evaluation subset is empty")]
pub struct EmptyEvaluationSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Confusion matrix over both outcomes.
pub struct ConfusionMatrix {
    /// Row-major `2x2` counts (`truth * 2 + predicted`).
    pub counts: [u32; 4],
}

impl ConfusionMatrix {
    pub fn add(&mut self, truth: Outcome, predicted: Outcome) {
        let idx = truth.index() * 2 + predicted.index();
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: Outcome, predicted: Outcome) -> u32 {
        self.counts[truth.index() * 2 + predicted.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| u64::from(v)).sum()
    }

    pub fn correct(&self) -> u64 {
        Outcome::ALL
            .iter()
            .map(|&outcome| u64::from(self.get(outcome, outcome)))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Precision/recall statistics for a single outcome.
pub struct PerClassStats {
    pub outcome: Outcome,
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Full evaluation of a classifier against labelled rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Fraction of exact matches, in `[0, 1]`.
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<PerClassStats>,
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    Outcome::ALL
        .iter()
        .map(|&class| {
            let tp = f64::from(cm.get(class, class));
            let mut fp = 0f64;
            let mut fn_ = 0f64;
            let mut support = 0u32;
            for &other in &Outcome::ALL {
                let v = cm.get(class, other);
                support = support.saturating_add(v);
                if other != class {
                    fn_ += f64::from(v);
                    fp += f64::from(cm.get(other, class));
                }
            }
            let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
            let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
            PerClassStats {
                outcome: class,
                precision,
                recall,
                support,
            }
        })
        .collect()
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> Result<f64, EmptyEvaluationSet> {
    let total = cm.total();
    if total == 0 {
        return Err(EmptyEvaluationSet);
    }
    Ok(cm.correct() as f64 / total as f64)
}

/// Classify every row and tally the results.
pub fn confusion_matrix<C: Classifier + ?Sized>(model: &C, rows: &[LabeledRecord]) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::default();
    for row in rows {
        cm.add(row.outcome, model.classify(&row.record));
    }
    cm
}

/// Fraction of `rows` whose predicted outcome matches the recorded one.
pub fn evaluate_accuracy<C: Classifier + ?Sized>(
    model: &C,
    rows: &[LabeledRecord],
) -> Result<f64, EmptyEvaluationSet> {
    if rows.is_empty() {
        return Err(EmptyEvaluationSet);
    }
    let acc = accuracy(&confusion_matrix(model, rows))?;
    info!("Accuracy {:.4} over {} evaluation rows", acc, rows.len());
    Ok(acc)
}

/// Accuracy plus confusion matrix and per-class statistics.
pub fn evaluate<C: Classifier + ?Sized>(
    model: &C,
    rows: &[LabeledRecord],
) -> Result<EvaluationReport, EmptyEvaluationSet> {
    let confusion = confusion_matrix(model, rows);
    let accuracy = accuracy(&confusion)?;
    let per_class = precision_recall_by_class(&confusion);
    Ok(EvaluationReport {
        accuracy,
        confusion,
        per_class,
    })
}
