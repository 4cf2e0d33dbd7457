//! Cleaned AI4I Dataset Loader
//!
//! Reads the cleaned predictive-maintenance CSV into [`FeatureRow`]s and
//! `Machine failure` labels. Columns are located by header name, so extra
//! columns (UDI, product ID, failure-mode flags) are ignored and column
//! order in the file does not matter.
//!
//! The file is expected to be clean: any unparsable feature or label value
//! is an error carrying the offending line number.
//!
//! # Usage
//!
//! ```ignore
//! use motor_fault::dataset::Dataset;
//!
//! let dataset = Dataset::load("ai4i_dc_motor_cleaned.csv")?;
//! let rows = dataset.labeled_rows()?;
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::types::{FeatureRow, Label, LabeledRow, FEATURE_COLUMNS, NUM_FEATURES, TARGET_COLUMN};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Dataset is empty (no header row)")]
    Empty,

    #[error("Missing column '{0}' in header")]
    MissingColumn(String),

    #[error("Line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Dataset has no data rows")]
    NoRows,
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Header positions of the feature columns and (optionally) the label.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    features: [usize; NUM_FEATURES],
    label: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Result<Self, DatasetError> {
        let names: Vec<String> = csv_split(header)
            .into_iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let position = |wanted: &str| names.iter().position(|n| n == wanted);

        let mut features = [0usize; NUM_FEATURES];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = position(name).ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        }

        Ok(Self {
            features,
            label: position(TARGET_COLUMN),
        })
    }

    fn width(&self) -> usize {
        self.features
            .iter()
            .copied()
            .chain(self.label)
            .max()
            .map_or(0, |m| m + 1)
    }
}

fn parse_value(fields: &[String], idx: usize, column: &str, line: usize) -> Result<f64, DatasetError> {
    let raw = fields[idx].trim();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DatasetError::InvalidValue {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

fn parse_label(fields: &[String], idx: usize, line: usize) -> Result<Label, DatasetError> {
    let raw = fields[idx].trim();
    match raw.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if (v - 1.0).abs() < f64::EPSILON => Ok(1),
        _ => Err(DatasetError::InvalidValue {
            line,
            column: TARGET_COLUMN.to_string(),
            value: raw.to_string(),
        }),
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Feature rows in file order, plus labels when the file carries them.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<FeatureRow>,
    labels: Option<Vec<Label>>,
}

impl Dataset {
    /// Load a cleaned dataset CSV from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
        let dataset = Self::from_reader(BufReader::new(file))
            .map_err(|e| match e {
                DatasetError::Io(_, inner) => DatasetError::Io(path.to_path_buf(), inner),
                other => other,
            })?;

        tracing::info!(
            file = %path.display(),
            rows = dataset.len(),
            labeled = dataset.labels.is_some(),
            faults = dataset.fault_count(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV text from any buffered reader. The first line is the header.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DatasetError> {
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or(DatasetError::Empty)?
            .map_err(|e| DatasetError::Io(PathBuf::new(), e))?;
        let columns = ColumnMap::from_header(&header)?;
        let width = columns.width();

        let mut rows = Vec::new();
        let mut labels = columns.label.map(|_| Vec::new());

        for (i, line) in lines.enumerate() {
            let line_num = i + 2;
            let line = line.map_err(|e| DatasetError::Io(PathBuf::new(), e))?;
            if line.trim().is_empty() {
                continue;
            }

            let fields = csv_split(&line);
            if fields.len() < width {
                return Err(DatasetError::ShortRow {
                    line: line_num,
                    expected: width,
                    found: fields.len(),
                });
            }

            let mut values = [0.0; NUM_FEATURES];
            for ((value, &idx), name) in values.iter_mut().zip(&columns.features).zip(FEATURE_COLUMNS) {
                *value = parse_value(&fields, idx, name, line_num)?;
            }
            rows.push(FeatureRow::from_array(values));

            if let (Some(idx), Some(labels)) = (columns.label, labels.as_mut()) {
                labels.push(parse_label(&fields, idx, line_num)?);
            }
        }

        if rows.is_empty() {
            return Err(DatasetError::NoRows);
        }

        Ok(Self { rows, labels })
    }

    /// Build a labeled dataset directly from rows.
    pub fn from_labeled(rows: &[LabeledRow]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.features).collect(),
            labels: Some(rows.iter().map(|r| r.label).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature rows in file order.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Labels in file order; errors if the file had no label column.
    pub fn labels(&self) -> Result<&[Label], DatasetError> {
        self.labels
            .as_deref()
            .ok_or_else(|| DatasetError::MissingColumn(TARGET_COLUMN.to_string()))
    }

    /// Rows paired with their labels.
    pub fn labeled_rows(&self) -> Result<Vec<LabeledRow>, DatasetError> {
        let labels = self.labels()?;
        Ok(self
            .rows
            .iter()
            .zip(labels)
            .map(|(&features, &label)| LabeledRow { features, label })
            .collect())
    }

    /// Consume the dataset, keeping only the feature rows.
    pub fn into_rows(self) -> Vec<FeatureRow> {
        self.rows
    }

    /// Number of rows labeled as machine failure (0 when unlabeled).
    pub fn fault_count(&self) -> usize {
        self.labels
            .as_ref()
            .map_or(0, |l| l.iter().filter(|&&v| v == 1).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
UDI,Type,Process temperature [K],Rotational speed [rpm],Torque [Nm],Tool wear [min],Machine failure
1,M,308.6,1551,42.8,0,0
2,L,308.7,1408,46.3,3,0
3,L,310.8,1282,68.9,210,1
";

    #[test]
    fn test_csv_split_quotes() {
        assert_eq!(csv_split(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
        assert_eq!(csv_split(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(csv_split("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_load_sample() {
        let ds = Dataset::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.rows()[0], FeatureRow::new(308.6, 1551.0, 42.8, 0.0));
        assert_eq!(ds.labels().unwrap(), &[0, 0, 1]);
        assert_eq!(ds.fault_count(), 1);
    }

    #[test]
    fn test_column_order_independent() {
        let csv = "\
Machine failure,Tool wear [min],Torque [Nm],Rotational speed [rpm],Process temperature [K]
1,200,60.5,1300,311.2
";
        let ds = Dataset::from_reader(Cursor::new(csv)).unwrap();
        assert_eq!(ds.rows()[0], FeatureRow::new(311.2, 1300.0, 60.5, 200.0));
        assert_eq!(ds.labels().unwrap(), &[1]);
    }

    #[test]
    fn test_unlabeled_file() {
        let csv = "Process temperature [K],Rotational speed [rpm],Torque [Nm],Tool wear [min]\n309,1500,40,5\n";
        let ds = Dataset::from_reader(Cursor::new(csv)).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(matches!(ds.labels(), Err(DatasetError::MissingColumn(_))));
        assert!(ds.labeled_rows().is_err());
    }

    #[test]
    fn test_missing_feature_column() {
        let csv = "Process temperature [K],Torque [Nm],Tool wear [min]\n309,40,5\n";
        match Dataset::from_reader(Cursor::new(csv)) {
            Err(DatasetError::MissingColumn(c)) => assert_eq!(c, "Rotational speed [rpm]"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let csv = format!("{SAMPLE}4,L,abc,1500,40,5,0\n");
        match Dataset::from_reader(Cursor::new(csv)) {
            Err(DatasetError::InvalidValue { line, column, .. }) => {
                assert_eq!(line, 5);
                assert_eq!(column, "Process temperature [K]");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let csv = format!("{SAMPLE}4,L,309,1500,40,5,2\n");
        assert!(matches!(
            Dataset::from_reader(Cursor::new(csv)),
            Err(DatasetError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_header_only_is_error() {
        let csv = "Process temperature [K],Rotational speed [rpm],Torque [Nm],Tool wear [min]\n";
        assert!(matches!(Dataset::from_reader(Cursor::new(csv)), Err(DatasetError::NoRows)));
        assert!(matches!(Dataset::from_reader(Cursor::new("")), Err(DatasetError::Empty)));
    }
}
