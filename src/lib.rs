//! Motor Fault: DC motor failure prediction
//!
//! Random forest classifier over four sensor features (process temperature,
//! rotational speed, torque, tool wear) predicting `Machine failure`.
//!
//! ## Components
//!
//! - **Trainer**: holdout split, forest fit, artifact persistence
//! - **Evaluator**: accuracy, confusion matrix, per-class report, ROC/AUC
//! - **Random-Input Generator**: uniform synthetic sensor readings
//! - **Prediction Service**: sensor + prediction HTTP listeners, WebSocket replay
//! - **Continuous Test Driver**: HTTP round trips against both listeners

pub mod api;
pub mod config;
pub mod dataset;
pub mod driver;
pub mod evaluation;
pub mod forest;
pub mod generator;
pub mod replay;
pub mod server;
pub mod training;
pub mod types;

// Re-export configuration
pub use config::MotorConfig;

// Re-export commonly used types
pub use types::{FeatureRow, Label, LabeledRow, PredictResponse, PredictionResult, SensorEvent};

// Re-export model components
pub use forest::{Classifier, ModelArtifact, RandomForest};
pub use dataset::{Dataset, DatasetError};
