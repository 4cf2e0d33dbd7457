//! Prediction results and push-channel events

use serde::{Deserialize, Serialize};

use super::{FeatureRow, Label};

/// A prediction paired with the row that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub input: FeatureRow,
    pub prediction: Label,
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Label,
}

/// One replayed dataset row as pushed over the stream channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub input: FeatureRow,
    pub prediction: Label,
    /// Sensor columns whose value is above its dashboard threshold
    #[serde(default)]
    pub alerts: Vec<String>,
}

impl SensorEvent {
    pub const fn is_fault(&self) -> bool {
        self.prediction == 1
    }
}
