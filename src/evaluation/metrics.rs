//! Binary classification metrics: accuracy, confusion matrix, per-class
//! report, ROC curve and AUC.

use serde::Serialize;
use std::fmt;

use crate::types::Label;

/// Positive class for TP/FP/TN/FN and ROC.
pub const POSITIVE_LABEL: Label = 1;

/// Fraction of predictions equal to the truth. `NaN` for empty input.
pub fn accuracy(y_true: &[Label], y_pred: &[Label]) -> f64 {
    if y_true.is_empty() {
        return f64::NAN;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn sorted_labels(y_true: &[Label], y_pred: &[Label]) -> Vec<Label> {
    let mut labels: Vec<Label> = y_true.iter().chain(y_pred).copied().collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

// ============================================================================
// Confusion Matrix
// ============================================================================

/// `counts[actual][predicted]`, rows and columns ordered like `labels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<Label>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[Label], y_pred: &[Label]) -> Self {
        let labels = sorted_labels(y_true, y_pred);
        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (t, p) in y_true.iter().zip(y_pred) {
            if let (Ok(i), Ok(j)) = (labels.binary_search(t), labels.binary_search(p)) {
                counts[i][j] += 1;
            }
        }
        Self { labels, counts }
    }

    /// Count for an (actual, predicted) pair; 0 for labels never seen.
    pub fn get(&self, actual: Label, predicted: Label) -> usize {
        match (self.labels.binary_search(&actual), self.labels.binary_search(&predicted)) {
            (Ok(i), Ok(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Sum of all cells, i.e. the number of scored rows.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn true_positives(&self) -> usize {
        self.get(POSITIVE_LABEL, POSITIVE_LABEL)
    }

    pub fn false_positives(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l != POSITIVE_LABEL)
            .map(|&l| self.get(l, POSITIVE_LABEL))
            .sum()
    }

    pub fn false_negatives(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l != POSITIVE_LABEL)
            .map(|&l| self.get(POSITIVE_LABEL, l))
            .sum()
    }

    pub fn true_negatives(&self) -> usize {
        self.total() - self.true_positives() - self.false_positives() - self.false_negatives()
    }
}

// ============================================================================
// Classification Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision / recall / F1 with accuracy, macro and weighted
/// averages. `Display` renders the familiar fixed-width table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    /// Decimal places used by `Display`
    pub digits: usize,
}

impl ClassificationReport {
    pub fn new(confusion: &ConfusionMatrix, digits: usize) -> Self {
        let total = confusion.total();
        let n = confusion.labels.len();

        let classes: Vec<ClassMetrics> = (0..n)
            .map(|i| {
                let tp = confusion.counts[i][i] as f64;
                let predicted: usize = confusion.counts.iter().map(|row| row[i]).sum();
                let support: usize = confusion.counts[i].iter().sum();
                let precision = safe_div(tp, predicted as f64);
                let recall = safe_div(tp, support as f64);
                ClassMetrics {
                    label: confusion.labels[i].to_string(),
                    precision,
                    recall,
                    f1: safe_div(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let correct: usize = (0..n).map(|i| confusion.counts[i][i]).sum();
        let accuracy = safe_div(correct as f64, total as f64);

        let macro_avg = average("macro avg", &classes, total, |_| 1.0);
        let weighted_avg = average("weighted avg", &classes, total, |c| c.support as f64);

        Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
            digits,
        }
    }
}

/// Weighted mean of per-class precision, recall and F1.
fn average(
    name: &str,
    classes: &[ClassMetrics],
    total: usize,
    weight: impl Fn(&ClassMetrics) -> f64,
) -> ClassMetrics {
    let w_sum: f64 = classes.iter().map(&weight).sum();
    let avg = |metric: fn(&ClassMetrics) -> f64| {
        safe_div(classes.iter().map(|c| metric(c) * weight(c)).sum(), w_sum)
    };
    ClassMetrics {
        label: name.to_string(),
        precision: avg(|c| c.precision),
        recall: avg(|c| c.recall),
        f1: avg(|c| c.f1),
        support: total,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.digits;
        let w = (d + 3).max(9);
        let name_w = 12;

        writeln!(
            f,
            "{:>name_w$} {:>w$} {:>w$} {:>w$} {:>w$}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        let row = |f: &mut fmt::Formatter<'_>, c: &ClassMetrics| {
            writeln!(
                f,
                "{:>name_w$} {:>w$.d$} {:>w$.d$} {:>w$.d$} {:>w$}",
                c.label, c.precision, c.recall, c.f1, c.support
            )
        };
        for c in &self.classes {
            row(f, c)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>name_w$} {:>w$} {:>w$} {:>w$.d$} {:>w$}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}

// ============================================================================
// ROC Curve
// ============================================================================

/// Receiver operating characteristic. Points run from `(0, 0)` at
/// threshold `+inf` to `(1, 1)` at the lowest score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Build the curve from positive-class scores.
    ///
    /// Returns an empty curve when only one class is present, since either
    /// rate would be undefined.
    pub fn compute(y_true: &[Label], scores: &[f64]) -> Self {
        let positives = y_true.iter().filter(|&&l| l == POSITIVE_LABEL).count();
        let negatives = y_true.len() - positives;
        if positives == 0 || negatives == 0 {
            tracing::warn!(
                positives,
                negatives,
                "ROC undefined: dataset contains a single class"
            );
            return Self {
                fpr: Vec::new(),
                tpr: Vec::new(),
                thresholds: Vec::new(),
            };
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        let (mut tp, mut fp) = (0usize, 0usize);

        for (k, &i) in order.iter().enumerate() {
            if y_true[i] == POSITIVE_LABEL {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_score = order
                .get(k + 1)
                .map_or(true, |&next| scores[next] != scores[i]);
            if last_of_score {
                fpr.push(fp as f64 / negatives as f64);
                tpr.push(tp as f64 / positives as f64);
                thresholds.push(scores[i]);
            }
        }

        Self {
            fpr,
            tpr,
            thresholds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }

    /// Area under the curve (trapezoidal rule). `NaN` for an empty curve.
    pub fn auc(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        auc(&self.fpr, &self.tpr)
    }

    /// Highest TPR reached at or before the given FPR (step interpolation).
    pub fn tpr_at(&self, fpr: f64) -> f64 {
        self.fpr
            .iter()
            .zip(&self.tpr)
            .take_while(|(&x, _)| x <= fpr)
            .map(|(_, &y)| y)
            .fold(0.0, f64::max)
    }
}

/// Trapezoidal area under a piecewise-linear curve with ascending `x`.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}
