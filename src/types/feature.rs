//! Sensor feature rows

use serde::{Deserialize, Serialize};

/// Number of sensor features the classifier is trained on.
pub const NUM_FEATURES: usize = 4;

/// Column names in the exact order used at training time.
///
/// The JSON field names of [`FeatureRow`] and the CSV header names are both
/// taken from this list; changing the order invalidates existing artifacts.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "Process temperature [K]",
    "Rotational speed [rpm]",
    "Torque [Nm]",
    "Tool wear [min]",
];

/// Label column name in the cleaned dataset.
pub const TARGET_COLUMN: &str = "Machine failure";

/// Binary class label: 0 = healthy, 1 = machine failure.
pub type Label = u8;

/// One sensor reading used as classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Process temperature (K)
    #[serde(rename = "Process temperature [K]")]
    pub process_temperature: f64,
    /// Rotational speed (rpm)
    #[serde(rename = "Rotational speed [rpm]")]
    pub rotational_speed: f64,
    /// Torque (Nm)
    #[serde(rename = "Torque [Nm]")]
    pub torque: f64,
    /// Tool wear (min)
    #[serde(rename = "Tool wear [min]")]
    pub tool_wear: f64,
}

impl FeatureRow {
    pub const fn new(
        process_temperature: f64,
        rotational_speed: f64,
        torque: f64,
        tool_wear: f64,
    ) -> Self {
        Self {
            process_temperature,
            rotational_speed,
            torque,
            tool_wear,
        }
    }

    /// Feature values in [`FEATURE_COLUMNS`] order.
    pub const fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.process_temperature,
            self.rotational_speed,
            self.torque,
            self.tool_wear,
        ]
    }

    pub const fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// Historical reading with its ground-truth label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub features: FeatureRow,
    pub label: Label,
}
