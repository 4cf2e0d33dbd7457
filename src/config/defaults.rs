//! System-wide default constants.
//!
//! Grouped by subsystem. Most of them can be overridden through
//! `motor_config.toml`.

// ============================================================================
// Files
// ============================================================================

/// Cleaned AI4I dataset used for training, evaluation and stream replay.
pub const DATASET_PATH: &str = "ai4i_dc_motor_cleaned.csv";

/// Serialized forest written by `train`, read by `evaluate` and the service.
pub const MODEL_PATH: &str = "dc_motor_fault_model.json";

/// Artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

// ============================================================================
// Training
// ============================================================================

/// Trees in the forest.
pub const N_TREES: usize = 100;

/// Seed for the holdout shuffle and every tree's bootstrap RNG.
pub const RANDOM_SEED: u64 = 42;

/// Fraction of rows held out from fitting.
pub const HOLDOUT_FRACTION: f64 = 0.2;

/// Nodes with fewer samples than this become leaves.
pub const MIN_SAMPLES_SPLIT: usize = 2;

// ============================================================================
// Random-Input Generator
// ============================================================================

/// Process temperature range (K), inclusive on both ends.
pub const TEMPERATURE_RANGE: (f64, f64) = (305.0, 315.0);

/// Rotational speed range (rpm), upper bound exclusive.
pub const SPEED_RANGE: (f64, f64) = (1200.0, 2000.0);

/// Torque range (Nm), upper bound exclusive.
pub const TORQUE_RANGE: (f64, f64) = (20.0, 60.0);

/// Tool wear range (min), upper bound exclusive.
pub const TOOL_WEAR_RANGE: (f64, f64) = (0.0, 250.0);

// ============================================================================
// Prediction Service
// ============================================================================

/// Sensor service: random input, batch prediction, stream replay.
pub const SENSOR_ADDR: &str = "127.0.0.1:5001";

/// Prediction service: single-row `/predict`.
pub const PREDICT_ADDR: &str = "127.0.0.1:5002";

/// Rows generated and predicted by `/random_predict`.
pub const RANDOM_BATCH_SIZE: usize = 10;

/// Delay between stream emissions (ms).
pub const STREAM_INTERVAL_MS: u64 = 2_000;

// Dashboard alert thresholds (value above threshold raises an alert).

/// Process temperature alert threshold (K).
pub const TEMPERATURE_ALERT: f64 = 312.0;
/// Rotational speed alert threshold (rpm).
pub const SPEED_ALERT: f64 = 1_800.0;
/// Torque alert threshold (Nm).
pub const TORQUE_ALERT: f64 = 55.0;
/// Tool wear alert threshold (min).
pub const TOOL_WEAR_ALERT: f64 = 200.0;

// ============================================================================
// Continuous Test Driver
// ============================================================================

/// Random input endpoint polled by the driver.
pub const RANDOM_INPUT_URL: &str = "http://127.0.0.1:5001/random_input";

/// Prediction endpoint the driver submits to.
pub const PREDICT_URL: &str = "http://127.0.0.1:5002/predict";

/// Pause between driver cycles (seconds).
pub const DRIVER_DELAY_SECS: u64 = 3;
