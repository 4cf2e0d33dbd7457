//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! The raw TOML is walked first and any key not in [`known_config_keys`]
//! produces a warning with a "did you mean?" suggestion. Range checks run
//! on the deserialized struct and are fatal.

use std::collections::HashSet;

use super::{MotorConfig, RangeConfig};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of [`MotorConfig`].
///
/// Any new field added to the config structs must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let mut keys: Vec<&'static str> = vec![
        "paths",
        "paths.dataset",
        "paths.model",
        "training",
        "training.n_trees",
        "training.seed",
        "training.holdout_fraction",
        "training.max_depth",
        "training.min_samples_split",
        "generator",
        "server",
        "server.sensor_addr",
        "server.predict_addr",
        "stream",
        "stream.interval_ms",
        "stream.alerts",
        "stream.alerts.temperature",
        "stream.alerts.speed",
        "stream.alerts.torque",
        "stream.alerts.tool_wear",
        "driver",
        "driver.random_input_url",
        "driver.predict_url",
        "driver.delay_secs",
    ];
    for range in [
        ["generator.temperature", "generator.temperature.low", "generator.temperature.high"],
        ["generator.speed", "generator.speed.low", "generator.speed.high"],
        ["generator.torque", "generator.torque.low", "generator.torque.high"],
        ["generator.tool_wear", "generator.tool_wear.low", "generator.tool_wear.high"],
    ] {
        keys.extend(range);
    }
    keys.into_iter().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3. Ties resolve alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|&(_, d)| d <= 3)
        .min_by_key(|&(_, d)| d)
        .map(|(k, _)| k.to_string())
}

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails; parse errors are reported later by serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

fn check_range(name: &str, range: RangeConfig, errors: &mut Vec<String>) {
    if !range.low.is_finite() || !range.high.is_finite() {
        errors.push(format!("generator.{name} bounds must be finite"));
    } else if range.low >= range.high {
        errors.push(format!(
            "generator.{name}.low ({}) must be less than high ({})",
            range.low, range.high
        ));
    }
}

/// Values that would make training, generation or serving impossible.
pub fn validate_ranges(config: &MotorConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let t = &config.training;
    if t.n_trees == 0 {
        errors.push("training.n_trees must be at least 1".to_string());
    }
    if !(0.0..1.0).contains(&t.holdout_fraction) {
        errors.push(format!(
            "training.holdout_fraction = {} must be in [0, 1)",
            t.holdout_fraction
        ));
    }
    if t.min_samples_split < 2 {
        errors.push(format!(
            "training.min_samples_split = {} must be at least 2",
            t.min_samples_split
        ));
    }
    if t.max_depth == Some(0) {
        errors.push("training.max_depth must be at least 1 when set".to_string());
    }

    let g = &config.generator;
    check_range("temperature", g.temperature, &mut errors);
    check_range("speed", g.speed, &mut errors);
    check_range("torque", g.torque, &mut errors);
    check_range("tool_wear", g.tool_wear, &mut errors);

    if config.server.sensor_addr == config.server.predict_addr {
        errors.push(format!(
            "server.sensor_addr and server.predict_addr are both {}",
            config.server.sensor_addr
        ));
    }

    errors
}
