//! Evaluator: score a trained classifier against a labeled dataset.
//!
//! Produces accuracy, a confusion matrix, a per-class report and a ROC
//! curve. ROC scores come from [`Classifier::predict_proba`]; a model that
//! cannot provide probabilities is scored with its hard predictions
//! (0.0 / 1.0), which collapses the curve to a single operating point.

pub mod metrics;
pub mod render;

use serde::Serialize;

use crate::dataset::{Dataset, DatasetError};
use crate::forest::Classifier;

pub use metrics::{accuracy, ClassificationReport, ConfusionMatrix, RocCurve};

/// Where ROC scores came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Probability,
    HardPrediction,
}

/// Full evaluation result. Serializes to the `--report` JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub rows: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub roc: RocCurve,
    /// `None` when the dataset holds a single class
    pub auc: Option<f64>,
    pub score_source: ScoreSource,
}

/// Evaluate `model` over every row of `dataset`.
///
/// Fails if the dataset has no label column.
pub fn evaluate<C: Classifier + ?Sized>(
    model: &C,
    dataset: &Dataset,
) -> Result<Evaluation, DatasetError> {
    let y_true = dataset.labels()?;
    let rows = dataset.rows();

    let y_pred = model.predict_batch(rows);

    let probabilities: Option<Vec<f64>> = rows.iter().map(|r| model.predict_proba(r)).collect();
    let (scores, score_source) = match probabilities {
        Some(p) => (p, ScoreSource::Probability),
        None => (
            y_pred.iter().map(|&l| f64::from(l)).collect(),
            ScoreSource::HardPrediction,
        ),
    };

    let confusion = ConfusionMatrix::new(y_true, &y_pred);
    let report = ClassificationReport::new(&confusion, 4);
    let roc = RocCurve::compute(y_true, &scores);
    let auc = (!roc.is_empty()).then(|| roc.auc());

    let evaluation = Evaluation {
        rows: rows.len(),
        accuracy: accuracy(y_true, &y_pred),
        confusion,
        report,
        roc,
        auc,
        score_source,
    };

    tracing::info!(
        rows = evaluation.rows,
        accuracy = format!("{:.4}", evaluation.accuracy),
        auc = ?evaluation.auc,
        "Evaluation complete"
    );
    Ok(evaluation)
}
