//! Artifact store - fitted classifier, scaler and feature list
//!
//! Loaded once at startup; any failure here stops the process.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::inference::{Classifier, FeatureSchema, InferenceError, Predictor, StandardScaler};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("cannot read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("artifacts disagree: {0}")]
    Mismatch(#[from] InferenceError),
}

/// Locations of the three artifacts
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub features: PathBuf,
}

/// Load all artifacts and bind them into a [`Predictor`]
pub fn load(paths: &ArtifactPaths) -> Result<Predictor, ArtifactError> {
    let names: Vec<String> = read_json(&paths.features)?;
    let schema = FeatureSchema::new(names).map_err(|e| ArtifactError::Invalid {
        path: paths.features.clone(),
        reason: e.to_string(),
    })?;

    let scaler: StandardScaler = read_json(&paths.scaler)?;
    scaler.validate().map_err(|reason| ArtifactError::Invalid {
        path: paths.scaler.clone(),
        reason,
    })?;

    let classifier: Classifier = read_json(&paths.model)?;
    classifier.validate().map_err(|reason| ArtifactError::Invalid {
        path: paths.model.clone(),
        reason,
    })?;

    tracing::info!(
        "Artifacts loaded: {} features, classifier with {} inputs",
        schema.len(),
        classifier.n_features()
    );

    Ok(Predictor::new(schema, scaler, classifier)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        sha256 = %checksum(&bytes),
        "Reading artifact"
    );

    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Hex-encoded SHA-256 of an artifact's bytes
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const FEATURES: &str = r#"["Age", "Balance"]"#;
    const SCALER: &str = r#"{"mean": [40.0, 0.0], "scale": [10.0, 1.0]}"#;
    const MODEL: &str = r#"{"kind": "logistic_regression", "coef": [1.0, 0.0], "intercept": 0.0}"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn paths(dir: &TempDir, features: &str, scaler: &str, model: &str) -> ArtifactPaths {
        ArtifactPaths {
            features: write(dir, "features.json", features),
            scaler: write(dir, "scaler.json", scaler),
            model: write(dir, "model.json", model),
        }
    }

    #[test]
    fn test_load_valid_artifacts() {
        let dir = TempDir::new().unwrap();
        let predictor = load(&paths(&dir, FEATURES, SCALER, MODEL)).unwrap();
        assert_eq!(predictor.schema().names(), &["Age".to_string(), "Balance".to_string()]);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut paths = paths(&dir, FEATURES, SCALER, MODEL);
        paths.model = dir.path().join("absent.json");
        assert!(matches!(load(&paths), Err(ArtifactError::Io { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir, FEATURES, "{not json", MODEL);
        assert!(matches!(load(&paths), Err(ArtifactError::Parse { .. })));
    }

    #[test]
    fn test_duplicate_feature_names() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir, r#"["Age", "Age"]"#, SCALER, MODEL);
        assert!(matches!(load(&paths), Err(ArtifactError::Invalid { .. })));
    }

    #[test]
    fn test_scaler_fitted_on_other_columns() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir, r#"["Age", "Balance", "Tenure"]"#, SCALER, MODEL);
        assert!(matches!(load(&paths), Err(ArtifactError::Mismatch(_))));
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
