//! Serialized model artifact.
//!
//! The artifact bundles the fitted forest with the feature schema it was
//! trained on and a little provenance. It deliberately carries no
//! timestamp: re-training on the same data with the same seed must write
//! a byte-identical file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ModelError, RandomForest};
use crate::config::defaults::ARTIFACT_VERSION;
use crate::types::{FEATURE_COLUMNS, TARGET_COLUMN};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Format version for forward compatibility.
    pub version: u32,
    /// Feature columns in the order the forest expects them.
    pub feature_names: Vec<String>,
    /// Label column the forest was fitted against.
    pub target: String,
    pub metadata: TrainingMetadata,
    pub forest: RandomForest,
}

/// Provenance recorded by the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Rows the forest was fitted on.
    pub training_rows: usize,
    /// Rows withheld for the holdout check.
    pub holdout_rows: usize,
    /// Accuracy on the holdout rows, if any were withheld.
    pub holdout_accuracy: Option<f64>,
}

impl ModelArtifact {
    /// Wrap a freshly fitted forest with the compiled-in feature schema.
    pub fn new(forest: RandomForest, metadata: TrainingMetadata) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            feature_names: FEATURE_COLUMNS.iter().map(ToString::to_string).collect(),
            target: TARGET_COLUMN.to_string(),
            metadata,
            forest,
        }
    }

    /// Reject artifacts from another format version or feature order.
    pub fn check_compatible(&self) -> Result<(), ModelError> {
        if self.version != ARTIFACT_VERSION {
            return Err(ModelError::VersionMismatch {
                found: self.version,
                expected: ARTIFACT_VERSION,
            });
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(ModelError::SchemaMismatch {
                found: self.feature_names.clone(),
                expected: FEATURE_COLUMNS.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(())
    }
}

/// Save an artifact to disk atomically (write temp file, then rename).
pub fn save_to_disk(artifact: &ModelArtifact, path: &Path) -> Result<(), ModelError> {
    let json = serde_json::to_vec(artifact)?;

    let io_err = |e| ModelError::Io(path.to_path_buf(), e);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Load an artifact from disk and check it matches the compiled-in schema.
pub fn load_from_disk(path: &Path) -> Result<ModelArtifact, ModelError> {
    let data = std::fs::read(path).map_err(|e| ModelError::Io(path.to_path_buf(), e))?;
    let artifact: ModelArtifact = serde_json::from_slice(&data)?;
    artifact.check_compatible()?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tests::synthetic_rows;
    use crate::forest::{Classifier, ForestConfig};

    fn small_artifact() -> ModelArtifact {
        let config = ForestConfig {
            n_trees: 5,
            ..ForestConfig::default()
        };
        let forest = RandomForest::fit(config, &synthetic_rows(100)).unwrap();
        ModelArtifact::new(
            forest,
            TrainingMetadata {
                training_rows: 100,
                holdout_rows: 0,
                holdout_accuracy: None,
            },
        )
    }

    #[test]
    fn test_disk_persistence() {
        let artifact = small_artifact();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("forest.json");

        save_to_disk(&artifact, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_from_disk(&path).unwrap();
        assert_eq!(loaded, artifact);

        let row = synthetic_rows(1)[0].features;
        assert_eq!(loaded.forest.predict(&row), artifact.forest.predict(&row));
    }

    #[test]
    fn test_reject_wrong_version() {
        let mut artifact = small_artifact();
        artifact.version = 99;
        assert!(matches!(
            artifact.check_compatible(),
            Err(ModelError::VersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_reject_reordered_features() {
        let mut artifact = small_artifact();
        artifact.feature_names.swap(0, 1);
        assert!(matches!(
            artifact.check_compatible(),
            Err(ModelError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_from_disk(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ModelError::Io(..))));
    }
}
