//! Random Forest Classifier
//!
//! Bagged ensemble of CART trees for motor fault prediction:
//! - Bootstrap sample per tree (n draws with replacement)
//! - `sqrt(n_features)` candidate features per split
//! - Gini impurity, midpoint thresholds
//! - Soft voting: class probabilities averaged over trees
//!
//! Tree `i` draws from an RNG seeded with `seed + i`, and trees are fitted
//! in parallel but collected in index order, so the same data and seed
//! always produce the same forest.

mod tree;
pub mod artifact;

pub use artifact::{load_from_disk, save_to_disk, ModelArtifact, TrainingMetadata};
pub use tree::{DecisionTree, Node, TreeParams};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{defaults, TrainingConfig};
use crate::types::{FeatureRow, Label, LabeledRow, NUM_FEATURES};

// ============================================================================
// Classifier seam
// ============================================================================

/// Anything that maps a feature row to a class label.
///
/// `predict_proba` is optional; callers that need scores (ROC) fall back
/// to hard predictions when it returns `None`.
pub trait Classifier: Send + Sync {
    /// Class labels seen at fit time, ascending.
    fn classes(&self) -> &[Label];

    fn predict(&self, row: &FeatureRow) -> Label;

    /// Probability of the failure class (label 1), if supported.
    fn predict_proba(&self, _row: &FeatureRow) -> Option<f64> {
        None
    }

    fn predict_batch(&self, rows: &[FeatureRow]) -> Vec<Label> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Cannot fit a forest on an empty training set")]
    EmptyTrainingSet,

    #[error("Model I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Artifact version mismatch: file has v{found}, expected v{expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Feature schema mismatch: artifact trained on {found:?}, expected {expected:?}")]
    SchemaMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },
}

// ============================================================================
// Forest
// ============================================================================

/// Hyperparameters fixed at fit time and stored with the forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features per split; `None` means `sqrt(n_features)`
    pub max_features: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: defaults::N_TREES,
            seed: defaults::RANDOM_SEED,
            max_depth: None,
            min_samples_split: defaults::MIN_SAMPLES_SPLIT,
            max_features: None,
        }
    }
}

impl From<&TrainingConfig> for ForestConfig {
    fn from(t: &TrainingConfig) -> Self {
        Self {
            n_trees: t.n_trees,
            seed: t.seed,
            max_depth: t.max_depth,
            min_samples_split: t.min_samples_split,
            max_features: None,
        }
    }
}

impl ForestConfig {
    fn tree_params(&self) -> TreeParams {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let sqrt_features = (NUM_FEATURES as f64).sqrt() as usize;
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
            max_features: self
                .max_features
                .unwrap_or(sqrt_features)
                .clamp(1, NUM_FEATURES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    classes: Vec<Label>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on labeled rows.
    pub fn fit(config: ForestConfig, rows: &[LabeledRow]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let mut classes: Vec<Label> = rows.iter().map(|r| r.label).collect();
        classes.sort_unstable();
        classes.dedup();

        let x: Vec<[f64; NUM_FEATURES]> = rows.iter().map(|r| r.features.to_array()).collect();
        let y: Vec<usize> = rows
            .iter()
            .map(|r| classes.binary_search(&r.label).unwrap_or_default())
            .collect();

        let params = config.tree_params();
        let n = rows.len();

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(&x, &y, classes.len(), bootstrap, params, &mut rng)
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            rows = n,
            classes = ?classes,
            max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "Random forest fitted"
        );

        Ok(Self {
            config,
            classes,
            trees,
        })
    }

    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Averaged class probabilities, indexed like [`Classifier::classes`].
    pub fn class_probabilities(&self, row: &FeatureRow) -> Vec<f64> {
        let values = row.to_array();
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (s, p) in sum.iter_mut().zip(tree.leaf_distribution(&values)) {
                *s += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sum.iter_mut().for_each(|s| *s /= n);
        sum
    }

    /// Total node count across all trees.
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(DecisionTree::node_count).sum()
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[Label] {
        &self.classes
    }

    fn predict(&self, row: &FeatureRow) -> Label {
        let proba = self.class_probabilities(row);
        // First maximum wins ties, i.e. the lower label.
        let best = proba
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bp), (i, &p)| {
                if p > bp {
                    (i, p)
                } else {
                    (bi, bp)
                }
            })
            .0;
        self.classes.get(best).copied().unwrap_or_default()
    }

    fn predict_proba(&self, row: &FeatureRow) -> Option<f64> {
        let proba = self.class_probabilities(row);
        Some(
            self.classes
                .iter()
                .position(|&c| c == 1)
                .map_or(0.0, |i| proba[i]),
        )
    }
}
