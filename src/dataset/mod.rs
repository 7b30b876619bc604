//! Reference dataset types, CSV loading and deterministic train/evaluation splits.

pub mod loader;
pub mod split;

use std::path::{Path, PathBuf};

use crate::patient::{Outcome, PatientRecord};

pub use loader::{DatasetLoadError, SchemaProblem, UnavailableReason, load_dataset};
pub use split::{
    DEFAULT_EVALUATION_FRACTION, DEFAULT_SPLIT_SEED, DatasetSplit, SplitError, split_dataset,
};

/// One reference patient together with the observed outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledRecord {
    pub record: PatientRecord,
    pub outcome: Outcome,
}

impl LabeledRecord {
    pub fn new(record: PatientRecord, outcome: Outcome) -> Self {
        Self { record, outcome }
    }
}

/// Non-empty, read-only table of reference patients.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    source: Option<PathBuf>,
    rows: Vec<LabeledRecord>,
}

impl ReferenceDataset {
    /// Wrap in-memory rows. Returns `None` when `rows` is empty.
    pub fn from_rows(rows: Vec<LabeledRecord>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self { source: None, rows })
    }

    pub(crate) fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    /// File the rows were loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn rows(&self) -> &[LabeledRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row counts per outcome, indexed by [`Outcome::index`].
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.rows)
    }
}

/// Rows selected from a [`ReferenceDataset`], with the dataset row index of each.
#[derive(Debug, Clone, Default)]
pub struct Subset {
    pub rows: Vec<LabeledRecord>,
    /// Position of each row in the source dataset.
    pub source_indices: Vec<usize>,
}

impl Subset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.rows)
    }
}

fn class_counts(rows: &[LabeledRecord]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for row in rows {
        counts[row.outcome.index()] += 1;
    }
    counts
}
