//! Motor Config - every tunable value of the training and serving pipeline
//!
//! Each struct implements `Default` with the values of the original
//! deployment, so running without a config file behaves exactly like the
//! hard-coded scripts did.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use super::validation;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `MotorConfig::load()` which searches:
/// 1. `$MOTOR_CONFIG` env var
/// 2. `./motor_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotorConfig {
    /// Dataset and artifact locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Forest hyperparameters
    #[serde(default)]
    pub training: TrainingConfig,

    /// Random-input generator ranges
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Listener addresses
    #[serde(default)]
    pub server: ServerConfig,

    /// Stream replay cadence and alert thresholds
    #[serde(default)]
    pub stream: StreamConfig,

    /// Continuous test driver
    #[serde(default)]
    pub driver: DriverConfig,
}

impl MotorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$MOTOR_CONFIG` environment variable
    /// 2. `./motor_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("MOTOR_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from MOTOR_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from MOTOR_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "MOTOR_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("motor_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./motor_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./motor_config.toml, using defaults");
                }
            }
        }

        info!("No motor_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every range and count; collects all problems before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// [paths]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Cleaned dataset CSV
    #[serde(default = "default_dataset_path")]
    pub dataset: PathBuf,
    /// Serialized forest artifact
    #[serde(default = "default_model_path")]
    pub model: PathBuf,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(defaults::DATASET_PATH)
}

fn default_model_path() -> PathBuf {
    PathBuf::from(defaults::MODEL_PATH)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset_path(),
            model: default_model_path(),
        }
    }
}

// ============================================================================
// [training]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Seed for the holdout split and per-tree bootstrap RNGs
    pub seed: u64,
    /// Fraction of rows withheld from fitting (0 disables the holdout)
    pub holdout_fraction: f64,
    /// Maximum tree depth; unlimited when absent
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_trees: defaults::N_TREES,
            seed: defaults::RANDOM_SEED,
            holdout_fraction: defaults::HOLDOUT_FRACTION,
            max_depth: None,
            min_samples_split: defaults::MIN_SAMPLES_SPLIT,
        }
    }
}

// ============================================================================
// [generator]
// ============================================================================

/// A numeric sampling range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub low: f64,
    pub high: f64,
}

impl RangeConfig {
    pub const fn new((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Process temperature (K), inclusive upper bound
    pub temperature: RangeConfig,
    /// Rotational speed (rpm)
    pub speed: RangeConfig,
    /// Torque (Nm)
    pub torque: RangeConfig,
    /// Tool wear (min)
    pub tool_wear: RangeConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temperature: RangeConfig::new(defaults::TEMPERATURE_RANGE),
            speed: RangeConfig::new(defaults::SPEED_RANGE),
            torque: RangeConfig::new(defaults::TORQUE_RANGE),
            tool_wear: RangeConfig::new(defaults::TOOL_WEAR_RANGE),
        }
    }
}

// ============================================================================
// [server]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Sensor service bind address (`/random_input`, `/random_predict`, `/ws`)
    pub sensor_addr: String,
    /// Prediction service bind address (`/predict`)
    pub predict_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sensor_addr: defaults::SENSOR_ADDR.to_string(),
            predict_addr: defaults::PREDICT_ADDR.to_string(),
        }
    }
}

// ============================================================================
// [stream]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Delay between emitted rows (ms)
    pub interval_ms: u64,
    /// Per-sensor alert thresholds
    pub alerts: AlertThresholds,
}

impl StreamConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::STREAM_INTERVAL_MS,
            alerts: AlertThresholds::default(),
        }
    }
}

/// A sensor value strictly above its threshold raises an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub temperature: f64,
    pub speed: f64,
    pub torque: f64,
    pub tool_wear: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            temperature: defaults::TEMPERATURE_ALERT,
            speed: defaults::SPEED_ALERT,
            torque: defaults::TORQUE_ALERT,
            tool_wear: defaults::TOOL_WEAR_ALERT,
        }
    }
}

// ============================================================================
// [driver]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub random_input_url: String,
    pub predict_url: String,
    /// Pause between cycles (seconds)
    pub delay_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            random_input_url: defaults::RANDOM_INPUT_URL.to_string(),
            predict_url: defaults::PREDICT_URL.to_string(),
            delay_secs: defaults::DRIVER_DELAY_SECS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = MotorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.training.n_trees, 100);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.server.sensor_addr, "127.0.0.1:5001");
        assert_eq!(config.server.predict_addr, "127.0.0.1:5002");
        assert_eq!(config.stream.interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MotorConfig::from_toml_str(
            r#"
            [training]
            n_trees = 25

            [stream]
            interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.training.n_trees, 25);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.stream.interval_ms, 500);
        assert_eq!(config.stream.alerts.torque, 55.0);
        assert_eq!(config.paths.model, PathBuf::from("dc_motor_fault_model.json"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = MotorConfig::from_toml_str(
            r#"
            [generator.torque]
            low = 60.0
            high = 20.0
            "#,
        );
        match result {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("generator.torque")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let config = MotorConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = MotorConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.generator.speed, config.generator.speed);
        assert_eq!(parsed.driver.predict_url, config.driver.predict_url);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motor_config.toml");
        std::fs::write(&path, "[paths]\nmodel = \"models/forest.json\"\n").unwrap();

        let config = MotorConfig::load_from_file(&path).unwrap();
        assert_eq!(config.paths.model, PathBuf::from("models/forest.json"));
        assert_eq!(config.paths.dataset, PathBuf::from("ai4i_dc_motor_cleaned.csv"));
    }
}
