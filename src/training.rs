//! Trainer: holdout split, forest fit, artifact assembly.
//!
//! Rows are shuffled with the configured seed and the first
//! `ceil(n * holdout_fraction)` become the holdout; the forest is fitted on
//! the rest. Holdout accuracy is logged and stored in the artifact metadata
//! but does not influence the fit.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::config::TrainingConfig;
use crate::dataset::{Dataset, DatasetError};
use crate::evaluation::metrics::accuracy;
use crate::forest::{self, Classifier, ForestConfig, ModelArtifact, ModelError, RandomForest, TrainingMetadata};
use crate::types::{Label, LabeledRow};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Split rows into `(train, holdout)` with a seeded shuffle.
///
/// The training side is never left empty: with a single row everything is
/// used for fitting.
pub fn holdout_split(
    rows: &[LabeledRow],
    fraction: f64,
    seed: u64,
) -> (Vec<LabeledRow>, Vec<LabeledRow>) {
    let n = rows.len();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut holdout_len = (n as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize;
    if holdout_len >= n {
        holdout_len = n.saturating_sub(1);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let holdout = order[..holdout_len].iter().map(|&i| rows[i]).collect();
    let train = order[holdout_len..].iter().map(|&i| rows[i]).collect();
    (train, holdout)
}

/// Fit a forest on the training split and wrap it in an artifact.
pub fn train(rows: &[LabeledRow], config: &TrainingConfig) -> Result<ModelArtifact, ModelError> {
    let (train_rows, holdout_rows) = holdout_split(rows, config.holdout_fraction, config.seed);

    info!(
        train = train_rows.len(),
        holdout = holdout_rows.len(),
        n_trees = config.n_trees,
        seed = config.seed,
        "Fitting random forest"
    );
    let forest = RandomForest::fit(ForestConfig::from(config), &train_rows)?;

    let holdout_accuracy = (!holdout_rows.is_empty()).then(|| {
        let truth: Vec<Label> = holdout_rows.iter().map(|r| r.label).collect();
        let predicted: Vec<Label> = holdout_rows
            .iter()
            .map(|r| forest.predict(&r.features))
            .collect();
        accuracy(&truth, &predicted)
    });

    if let Some(acc) = holdout_accuracy {
        info!(accuracy = format!("{acc:.4}"), "Holdout accuracy");
    }

    Ok(ModelArtifact::new(
        forest,
        TrainingMetadata {
            training_rows: train_rows.len(),
            holdout_rows: holdout_rows.len(),
            holdout_accuracy,
        },
    ))
}

/// Load the dataset, train, and write the artifact to `model_path`.
pub fn train_from_file(
    dataset_path: &Path,
    model_path: &Path,
    config: &TrainingConfig,
) -> Result<ModelArtifact, TrainingError> {
    let dataset = Dataset::load(dataset_path)?;
    let rows = dataset.labeled_rows()?;
    let artifact = train(&rows, config)?;
    forest::save_to_disk(&artifact, model_path)?;
    info!(
        path = %model_path.display(),
        nodes = artifact.forest.node_count(),
        "Model artifact written"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tests::synthetic_rows;

    #[test]
    fn test_split_sizes() {
        let rows = synthetic_rows(101);
        let (train, holdout) = holdout_split(&rows, 0.2, 42);
        assert_eq!(holdout.len(), 21);
        assert_eq!(train.len(), 80);
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let rows = synthetic_rows(50);
        let (a_train, a_hold) = holdout_split(&rows, 0.2, 42);
        let (b_train, b_hold) = holdout_split(&rows, 0.2, 42);
        assert_eq!(a_train, b_train);
        assert_eq!(a_hold, b_hold);

        for h in &a_hold {
            assert!(!a_train.contains(h));
        }
    }

    #[test]
    fn test_zero_fraction_keeps_everything() {
        let rows = synthetic_rows(10);
        let (train, holdout) = holdout_split(&rows, 0.0, 1);
        assert_eq!(train.len(), 10);
        assert!(holdout.is_empty());
    }

    #[test]
    fn test_single_row_never_empties_training() {
        let rows = synthetic_rows(1);
        let (train, holdout) = holdout_split(&rows, 0.2, 1);
        assert_eq!(train.len(), 1);
        assert!(holdout.is_empty());
    }

    #[test]
    fn test_train_records_metadata() {
        let config = TrainingConfig {
            n_trees: 10,
            ..TrainingConfig::default()
        };
        let artifact = train(&synthetic_rows(200), &config).unwrap();
        assert_eq!(artifact.metadata.training_rows, 160);
        assert_eq!(artifact.metadata.holdout_rows, 40);
        let acc = artifact.metadata.holdout_accuracy.unwrap();
        assert!(acc > 0.8, "holdout accuracy {acc}");
        assert_eq!(artifact.forest.trees().len(), 10);
    }
}
