//! Shared data structures for motor fault prediction
//!
//! - FeatureRow: one sensor reading in training column order
//! - LabeledRow: a historical reading with its `Machine failure` label
//! - PredictionResult / SensorEvent: what the prediction service hands back

mod feature;
mod prediction;

pub use feature::*;
pub use prediction::*;
