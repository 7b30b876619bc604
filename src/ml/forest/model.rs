use crate::ml::Classifier;
use crate::patient::{FEATURE_COUNT, FEATURE_NAMES, InvalidRecord, Outcome, PatientRecord};

/// Node of a binary decision tree, stored in a flat arena.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Terminal node labelled with the majority outcome of its training rows.
    Leaf { outcome: Outcome, samples: u32 },
    /// Internal node: rows with `feature <= threshold` go left, others go right.
    Split {
        feature_index: u16,
        threshold: f64,
        left: u32,
        right: u32,
    },
}

/// Decision tree whose root is the first node of the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Build a tree from arena nodes.
    ///
    /// Returns `None` unless the arena is non-empty and every child index points past its parent
    /// and inside the arena, which guarantees every lookup terminates at a leaf.
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        for (idx, node) in nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature_index,
                left,
                right,
                ..
            } = node
            {
                let in_range = |child: u32| (child as usize) > idx && (child as usize) < nodes.len();
                if !in_range(*left) || !in_range(*right) || *feature_index as usize >= FEATURE_COUNT
                {
                    return None;
                }
            }
        }
        Some(Self { nodes })
    }

    /// Wrap an arena built by the trainer, which appends children after their parent.
    pub(super) fn from_ordered_arena(nodes: Vec<TreeNode>) -> Self {
        debug_assert!(Self::from_nodes(nodes.clone()).is_some());
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Label a feature vector in canonical order.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Outcome {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { outcome, .. } => return *outcome,
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features[*feature_index as usize];
                    let next = if value <= *threshold { *left } else { *right };
                    idx = next as usize;
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                let child_depth = depths[idx] + 1;
                depths[*left as usize] = child_depth;
                depths[*right as usize] = child_depth;
                max_depth = max_depth.max(child_depth);
            }
        }
        max_depth
    }
}

impl Classifier for DecisionTree {
    fn classify(&self, record: &PatientRecord) -> Outcome {
        self.predict(&record.features())
    }
}

/// Majority-vote ensemble of decision trees. Immutable once fit.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Returns `None` for an empty ensemble.
    pub fn from_trees(trees: Vec<DecisionTree>) -> Option<Self> {
        if trees.is_empty() {
            return None;
        }
        Some(Self { trees })
    }

    /// Feature names, in the order the trees index them.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Tree votes per outcome, indexed by [`Outcome::index`].
    pub fn votes(&self, record: &PatientRecord) -> [usize; 2] {
        let features = record.features();
        let mut votes = [0usize; 2];
        for tree in &self.trees {
            votes[tree.predict(&features).index()] += 1;
        }
        votes
    }

    /// Majority-vote label. A tied vote resolves to [`Outcome::Diabetic`].
    pub fn predict(&self, record: &PatientRecord) -> Outcome {
        majority(self.votes(record))
    }

    /// Fraction of trees voting [`Outcome::Diabetic`], in `[0, 1]`.
    pub fn diabetic_vote_share(&self, record: &PatientRecord) -> f64 {
        let votes = self.votes(record);
        votes[Outcome::Diabetic.index()] as f64 / self.trees.len() as f64
    }

    /// Predict from a raw feature vector in canonical order.
    pub fn predict_features(&self, features: &[f64]) -> Result<Outcome, InvalidRecord> {
        let record = PatientRecord::from_features(features)?;
        Ok(self.predict(&record))
    }

    /// Predict from named `(field, value)` pairs; see [`PatientRecord::from_named_fields`].
    pub fn predict_named<'a, I>(&self, fields: I) -> Result<Outcome, InvalidRecord>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let record = PatientRecord::from_named_fields(fields)?;
        Ok(self.predict(&record))
    }
}

impl Classifier for RandomForest {
    fn classify(&self, record: &PatientRecord) -> Outcome {
        self.predict(record)
    }
}

pub(super) fn majority(counts: [usize; 2]) -> Outcome {
    if counts[Outcome::Diabetic.index()] >= counts[Outcome::NonDiabetic.index()] {
        Outcome::Diabetic
    } else {
        Outcome::NonDiabetic
    }
}
