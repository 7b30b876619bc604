//! One-shot risk assessment: load, split, fit, then answer for one patient.
//!
//! Each stage consumes the previous stage's value, so the invocation walks
//! `Unloaded -> Loaded -> Split -> Fitted -> Queried` exactly once and keeps no shared state.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, RiskSettings};
use crate::dataset::{
    DatasetLoadError, DatasetSplit, ReferenceDataset, SplitError, load_dataset, split_dataset,
};
use crate::ml::forest::{self, FitError, RandomForest};
use crate::ml::metrics::{self, EmptyEvaluationSet, EvaluationReport};
use crate::patient::{InvalidRecord, Outcome, PatientRecord};

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetLoadError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error("invalid patient record: {0}")]
    InvalidRecord(#[from] InvalidRecord),
    #[error(transparent)]
    EmptyEvaluationSet(#[from] EmptyEvaluationSet),
}

/// What a front end shows for one patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub record: PatientRecord,
    pub outcome: Outcome,
    /// Fraction of trees voting diabetic.
    pub diabetic_vote_share: f64,
    /// Accuracy on the evaluation subset, in `[0, 1]`.
    pub accuracy: f64,
    pub training_rows: usize,
    pub evaluation_rows: usize,
}

impl RiskAssessment {
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy * 100.0
    }
}

/// A forest fit on the training subset, with the held-out rows kept for evaluation.
#[derive(Debug, Clone)]
pub struct FittedRiskModel {
    pub model: RandomForest,
    pub split: DatasetSplit,
}

impl FittedRiskModel {
    /// Split `dataset` and fit a forest on the training side.
    pub fn fit(
        dataset: &ReferenceDataset,
        settings: &RiskSettings,
    ) -> Result<Self, AssessmentError> {
        let split = split_dataset(
            dataset,
            settings.split.evaluation_fraction,
            settings.split.seed,
        )?;
        let options = settings.forest.train_options()?;
        let model = forest::fit(&split.training.rows, &options)?;
        Ok(Self { model, split })
    }

    pub fn predict(&self, record: &PatientRecord) -> Outcome {
        self.model.predict(record)
    }

    pub fn accuracy(&self) -> Result<f64, EmptyEvaluationSet> {
        metrics::evaluate_accuracy(&self.model, &self.split.evaluation.rows)
    }

    pub fn evaluation_report(&self) -> Result<EvaluationReport, EmptyEvaluationSet> {
        metrics::evaluate(&self.model, &self.split.evaluation.rows)
    }

    /// Classify `record` and measure accuracy on the evaluation subset.
    pub fn assess(&self, record: &PatientRecord) -> Result<RiskAssessment, AssessmentError> {
        let outcome = self.predict(record);
        let accuracy = self.accuracy()?;
        Ok(RiskAssessment {
            record: *record,
            outcome,
            diabetic_vote_share: self.model.diabetic_vote_share(record),
            accuracy,
            training_rows: self.split.training.len(),
            evaluation_rows: self.split.evaluation.len(),
        })
    }
}

/// Run the whole pipeline for one patient record.
pub fn assess(
    settings: &RiskSettings,
    record: &PatientRecord,
) -> Result<RiskAssessment, AssessmentError> {
    let dataset = load_dataset(&settings.dataset_path)?;
    let fitted = FittedRiskModel::fit(&dataset, settings)?;
    let assessment = fitted.assess(record)?;
    info!(
        "Assessment: {} ({:.0}% of trees), accuracy {:.2}%",
        assessment.outcome,
        assessment.diabetic_vote_share * 100.0,
        assessment.accuracy_percent()
    );
    Ok(assessment)
}
