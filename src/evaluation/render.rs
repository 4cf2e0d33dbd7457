//! Plain-text rendering of evaluation figures for terminal output.

use std::fmt;

use super::metrics::{ConfusionMatrix, RocCurve};

/// Labelled grid, actual classes down the side, predicted across the top.
pub fn render_confusion_matrix(cm: &ConfusionMatrix) -> String {
    ConfusionGrid(cm).to_string()
}

/// ROC chart on a `width` x `height` character grid.
///
/// `*` marks the curve, `.` the chance diagonal. Returns a short notice
/// instead when the curve is empty.
pub fn render_roc(roc: &RocCurve, width: usize, height: usize) -> String {
    if roc.is_empty() {
        return "ROC curve unavailable: dataset contains a single class\n".to_string();
    }
    RocChart {
        roc,
        width: width.max(10),
        height: height.max(5),
    }
    .to_string()
}

struct ConfusionGrid<'a>(&'a ConfusionMatrix);

impl fmt::Display for ConfusionGrid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cm = self.0;
        let cell_w = cm
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(6);

        writeln!(f, "Confusion Matrix (rows: actual, columns: predicted)")?;
        write!(f, "{:>10}", "")?;
        for label in &cm.labels {
            write!(f, " {:>cell_w$}", format!("pred {label}"))?;
        }
        writeln!(f)?;
        for (label, row) in cm.labels.iter().zip(&cm.counts) {
            write!(f, "{:>10}", format!("actual {label}"))?;
            for count in row {
                write!(f, " {count:>cell_w$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct RocChart<'a> {
    roc: &'a RocCurve,
    width: usize,
    height: usize,
}

impl RocChart<'_> {
    fn grid(&self) -> Vec<Vec<char>> {
        let (width, height) = (self.width, self.height);
        let mut grid = vec![vec![' '; width]; height];
        let to_col = |x: f64| ((x.clamp(0.0, 1.0) * (width - 1) as f64).round()) as usize;
        let to_row =
            |y: f64| height - 1 - ((y.clamp(0.0, 1.0) * (height - 1) as f64).round()) as usize;

        for col in 0..width {
            let x = col as f64 / (width - 1) as f64;
            grid[to_row(x)][col] = '.';
        }

        // Step through each column so vertical jumps leave no gaps.
        for col in 0..width {
            let x = col as f64 / (width - 1) as f64;
            grid[to_row(self.roc.tpr_at(x))][col] = '*';
        }
        for (&x, &y) in self.roc.fpr.iter().zip(&self.roc.tpr) {
            grid[to_row(y)][to_col(x)] = '*';
        }
        grid
    }
}

impl fmt::Display for RocChart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROC Curve (AUC = {:.4})", self.roc.auc())?;
        for (i, row) in self.grid().iter().enumerate() {
            let axis = match i {
                0 => "1.0",
                r if r == self.height - 1 => "0.0",
                _ => "",
            };
            let line: String = row.iter().collect();
            writeln!(f, "{axis:>4} |{line}")?;
        }
        writeln!(f, "     +{}", "-".repeat(self.width))?;
        writeln!(
            f,
            "      0.0{:>pad$}",
            "1.0",
            pad = self.width.saturating_sub(3)
        )?;
        writeln!(f, "      False Positive Rate (x) vs True Positive Rate (y)")
    }
}
