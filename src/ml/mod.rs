//! Machine learning building blocks: the random-forest classifier and its evaluation metrics.

pub mod forest;
pub mod metrics;

use crate::patient::{Outcome, PatientRecord};

/// Anything that labels a single patient record.
pub trait Classifier {
    fn classify(&self, record: &PatientRecord) -> Outcome;
}
