//! Random-forest classifier over patient records.
//!
//! Trees are CART trees grown on Gini impurity, each from a bootstrap resample of the training rows
//! and a random feature subset at every split point. The ensemble labels a record by majority vote.
//! Randomness is injected by the caller, so fitting is reproducible whenever the generator is seeded.

mod model;
mod train;

pub use model::{DecisionTree, RandomForest, TreeNode};
pub use train::{FitError, MaxFeatures, TrainOptions, fit, fit_with_rng};
