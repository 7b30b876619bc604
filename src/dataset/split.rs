//! Deterministic train/evaluation partition of the reference dataset.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use super::{ReferenceDataset, Subset};

/// Share of rows held out for evaluation.
pub const DEFAULT_EVALUATION_FRACTION: f64 = 0.2;
/// Seed for the row permutation.
pub const DEFAULT_SPLIT_SEED: u64 = 0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("evaluation fraction must be strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),
}

/// Training and evaluation subsets of one dataset.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub training: Subset,
    pub evaluation: Subset,
}

/// Number of evaluation rows for a dataset of `total` rows.
pub fn evaluation_size(total: usize, evaluation_fraction: f64) -> usize {
    let size = (total as f64 * evaluation_fraction).round() as usize;
    size.min(total)
}

/// Partition `dataset` into training and evaluation subsets.
///
/// Rows are permuted with a generator seeded from `seed`; the first
/// `N - round(evaluation_fraction * N)` permuted rows train and the rest evaluate. The same
/// dataset size, fraction and seed always produce the same partition.
pub fn split_dataset(
    dataset: &ReferenceDataset,
    evaluation_fraction: f64,
    seed: u64,
) -> Result<DatasetSplit, SplitError> {
    if !(evaluation_fraction > 0.0 && evaluation_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(evaluation_fraction));
    }
    let total = dataset.len();
    let evaluation_n = evaluation_size(total, evaluation_fraction);
    let training_n = total - evaluation_n;

    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let (training_idx, evaluation_idx) = order.split_at(training_n);
    let split = DatasetSplit {
        training: select(dataset, training_idx),
        evaluation: select(dataset, evaluation_idx),
    };
    if split.evaluation.is_empty() || split.training.is_empty() {
        warn!(
            "Degenerate split of {total} rows: {} training, {} evaluation",
            split.training.len(),
            split.evaluation.len()
        );
    }
    info!(
        "Split {total} rows into {} training / {} evaluation (fraction {evaluation_fraction}, seed {seed})",
        split.training.len(),
        split.evaluation.len()
    );
    Ok(split)
}

fn select(dataset: &ReferenceDataset, indices: &[usize]) -> Subset {
    let rows = dataset.rows();
    Subset {
        rows: indices.iter().map(|&idx| rows[idx]).collect(),
        source_indices: indices.to_vec(),
    }
}
