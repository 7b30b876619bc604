use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use super::model::{DecisionTree, RandomForest, TreeNode, majority};
use crate::dataset::LabeledRecord;
use crate::patient::{FEATURE_COUNT, Outcome};

/// How many features each split point may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// `floor(sqrt(feature_count))`, at least one.
    Sqrt,
    /// `floor(log2(feature_count))`, at least one.
    Log2,
    All,
    /// Fixed count, clamped to `1..=feature_count`.
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, feature_count: usize) -> usize {
        let n = match self {
            Self::Sqrt => (feature_count as f64).sqrt().floor() as usize,
            Self::Log2 => (feature_count as f64).log2().floor() as usize,
            Self::All => feature_count,
            Self::Count(n) => n,
        };
        n.clamp(1, feature_count.max(1))
    }
}

/// Forest shape and randomness settings.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub tree_count: usize,
    /// `None` grows each tree until its leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw a bootstrap resample per tree; otherwise every tree sees all rows.
    pub bootstrap: bool,
    /// Seed for [`fit`]. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            tree_count: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("cannot fit a forest on an empty training set")]
    EmptyTrainingSet,
}

/// Fit a forest, seeding the generator from `options.seed` or from OS entropy.
///
/// Without a seed, repeated fits on identical rows may grow different trees and so give slightly
/// different predictions and accuracy.
pub fn fit(rows: &[LabeledRecord], options: &TrainOptions) -> Result<RandomForest, FitError> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    fit_with_rng(rows, options, &mut rng)
}

/// Fit a forest drawing all randomness from `rng`.
pub fn fit_with_rng<R: Rng>(
    rows: &[LabeledRecord],
    options: &TrainOptions,
    rng: &mut R,
) -> Result<RandomForest, FitError> {
    if rows.is_empty() {
        return Err(FitError::EmptyTrainingSet);
    }
    let started = Instant::now();
    let x: Vec<[f64; FEATURE_COUNT]> = rows.iter().map(|row| row.record.features()).collect();
    let y: Vec<Outcome> = rows.iter().map(|row| row.outcome).collect();
    let builder = TreeBuilder {
        x: &x,
        y: &y,
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split.max(2),
        min_samples_leaf: options.min_samples_leaf.max(1),
        max_features: options.max_features.resolve(FEATURE_COUNT),
    };

    let n = rows.len();
    let tree_count = options.tree_count.max(1);
    let mut trees = Vec::with_capacity(tree_count);
    for tree_idx in 0..tree_count {
        let samples: Vec<usize> = if options.bootstrap {
            (0..n).map(|_| rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        let tree = builder.build(samples, rng);
        debug!(
            "Tree {tree_idx}: {} nodes, {} leaves, depth {}",
            tree.nodes().len(),
            tree.leaf_count(),
            tree.depth()
        );
        trees.push(tree);
    }

    info!(
        "Fitted {tree_count} trees on {n} rows in {:.2?}",
        started.elapsed()
    );
    RandomForest::from_trees(trees).ok_or(FitError::EmptyTrainingSet)
}

struct TreeBuilder<'a> {
    x: &'a [[f64; FEATURE_COUNT]],
    y: &'a [Outcome],
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    impurity: f64,
    feature_index: usize,
    threshold: f64,
}

impl TreeBuilder<'_> {
    fn build<R: Rng>(&self, samples: Vec<usize>, rng: &mut R) -> DecisionTree {
        let placeholder = TreeNode::Leaf {
            outcome: Outcome::NonDiabetic,
            samples: 0,
        };
        let mut nodes = vec![placeholder.clone()];
        let mut pending: Vec<(usize, Vec<usize>, usize)> = vec![(0, samples, 0)];

        while let Some((node_idx, samples, depth)) = pending.pop() {
            let counts = class_counts(self.y, &samples);
            let splittable = samples.len() >= self.min_samples_split
                && counts[0] > 0
                && counts[1] > 0
                && self.max_depth.is_none_or(|max| depth < max);
            let candidate = if splittable {
                self.best_split(&samples, counts, rng)
            } else {
                None
            };

            let Some(candidate) = candidate else {
                nodes[node_idx] = TreeNode::Leaf {
                    outcome: majority(counts),
                    samples: samples.len() as u32,
                };
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| self.x[i][candidate.feature_index] <= candidate.threshold);
            let left_idx = nodes.len();
            nodes.push(placeholder.clone());
            let right_idx = nodes.len();
            nodes.push(placeholder.clone());
            nodes[node_idx] = TreeNode::Split {
                feature_index: candidate.feature_index as u16,
                threshold: candidate.threshold,
                left: left_idx as u32,
                right: right_idx as u32,
            };
            pending.push((right_idx, right, depth + 1));
            pending.push((left_idx, left, depth + 1));
        }

        DecisionTree::from_ordered_arena(nodes)
    }

    /// Search a random feature order, stopping once `max_features` non-constant features were seen.
    fn best_split<R: Rng>(
        &self,
        samples: &[usize],
        counts: [usize; 2],
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let mut features: [usize; FEATURE_COUNT] = std::array::from_fn(|i| i);
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut informative = 0usize;
        let mut column: Vec<(f64, Outcome)> = Vec::with_capacity(samples.len());
        for &feature_index in &features {
            if informative >= self.max_features {
                break;
            }
            column.clear();
            column.extend(samples.iter().map(|&i| (self.x[i][feature_index], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (Some(first), Some(last)) = (column.first(), column.last()) else {
                continue;
            };
            if first.0 == last.0 {
                continue;
            }
            informative += 1;
            if let Some(candidate) = self.best_threshold(&column, counts, feature_index) {
                if best.is_none_or(|current| candidate.impurity < current.impurity) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Sweep the sorted column, scoring each boundary between distinct values.
    fn best_threshold(
        &self,
        column: &[(f64, Outcome)],
        total: [usize; 2],
        feature_index: usize,
    ) -> Option<SplitCandidate> {
        let n = column.len();
        let mut left = [0usize; 2];
        let mut best: Option<SplitCandidate> = None;
        for i in 0..n - 1 {
            left[column[i].1.index()] += 1;
            let (value, next) = (column[i].0, column[i + 1].0);
            if value == next {
                continue;
            }
            let left_n = i + 1;
            let right_n = n - left_n;
            if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                continue;
            }
            let right = [total[0] - left[0], total[1] - left[1]];
            let impurity = (left_n as f64 * gini(left, left_n)
                + right_n as f64 * gini(right, right_n))
                / n as f64;
            if best.is_none_or(|current| impurity < current.impurity) {
                let mid = value + (next - value) / 2.0;
                let threshold = if mid < next { mid } else { value };
                best = Some(SplitCandidate {
                    impurity,
                    feature_index,
                    threshold,
                });
            }
        }
        best
    }
}

fn class_counts(y: &[Outcome], samples: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in samples {
        counts[y[i].index()] += 1;
    }
    counts
}

fn gini(counts: [usize; 2], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let p0 = counts[0] as f64 / total;
    let p1 = counts[1] as f64 / total;
    1.0 - p0 * p0 - p1 * p1
}
