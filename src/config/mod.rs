//! Motor Fault Configuration Module
//!
//! Paths, forest hyperparameters, generator ranges, listener addresses and
//! driver settings, loaded from TOML with built-in defaults for everything.
//!
//! ## Loading Order
//!
//! 1. `MOTOR_CONFIG` environment variable (path to TOML file)
//! 2. `motor_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(MotorConfig::load());
//!
//! // Anywhere else:
//! let seed = config::get().training.seed;
//! ```

mod motor_config;
pub mod defaults;
pub mod validation;

pub use motor_config::*;

use std::sync::OnceLock;

/// Global configuration, initialized once at startup.
static MOTOR_CONFIG: OnceLock<MotorConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// A second call is ignored with a warning.
pub fn init(config: MotorConfig) {
    if MOTOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Panics if `init()` has not been called. A missing config is a startup
/// bug, not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn get() -> &'static MotorConfig {
    MOTOR_CONFIG
        .get()
        .expect("config::get() called before config::init()")
}
