//! Model artifact persistence.
//!
//! The fitted pipeline is stored as pretty-printed JSON. Floats are written
//! with shortest round-trip formatting, so a saved model predicts exactly
//! like the in-memory one it came from.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::domain::{LogisticPipeline, ModelError};

/// Load and validate a model artifact.
///
/// # Errors
/// Returns `NotFound` if the file does not exist, `FeatureOrder` if it was
/// trained on a different column layout, or `InvalidArtifact` /
/// `Serialization` for a damaged file.
pub fn load_model(path: &Path) -> Result<LogisticPipeline, ModelError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ModelError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let pipeline: LogisticPipeline = serde_json::from_str(&raw)?;
    pipeline.validate()?;

    tracing::info!(
        "Loaded model from {:?} (trained_at={}, test_accuracy={:.4})",
        path,
        pipeline.metadata.trained_at,
        pipeline.metadata.test_accuracy
    );
    Ok(pipeline)
}

/// Validate and write a model artifact, creating parent directories.
///
/// # Errors
/// Returns error if the pipeline is invalid or the file cannot be written.
pub fn save_model(path: &Path, pipeline: &LogisticPipeline) -> Result<(), ModelError> {
    pipeline.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec_pretty(pipeline)?;
    fs::write(path, json)?;
    tracing::info!("Saved model to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientFeatures, FEATURE_COUNT};
    use tempfile::tempdir;

    fn pipeline() -> LogisticPipeline {
        let mean: Vec<f64> = (0..FEATURE_COUNT).map(|i| 0.1 + 0.2 * i as f64).collect();
        let scale: Vec<f64> = (0..FEATURE_COUNT).map(|i| 1.0 / 3.0 + i as f64).collect();
        let coefficients: Vec<f64> = (0..FEATURE_COUNT)
            .map(|i| (if i % 2 == 0 { 0.7 } else { -0.3 }) / 7.0)
            .collect();
        let mut p = LogisticPipeline::new(mean, scale, coefficients, -0.123_456_789).expect("valid");
        p.metadata.seed = 42;
        p.metadata.test_accuracy = 0.852_459;
        p
    }

    #[test]
    fn test_save_then_load_predicts_identically() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("models/heart_disease_model.json");
        let original = pipeline();

        save_model(&path, &original).expect("save");
        let loaded = load_model(&path).expect("load");
        assert_eq!(loaded, original);

        let features = PatientFeatures {
            age: 63.0,
            cholesterol: 233.0,
            st_depression: 2.3,
            ..PatientFeatures::default()
        };
        let a = original.predict(&features).expect("predict");
        let b = loaded.predict(&features).expect("predict");
        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let err = load_model(&dir.path().join("absent.json")).expect_err("must fail");
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_reordered_artifact_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        let mut p = pipeline();
        p.feature_names.swap(0, 1);
        fs::write(&path, serde_json::to_vec(&p).expect("json")).expect("write");

        assert!(matches!(
            load_model(&path),
            Err(ModelError::FeatureOrder { .. })
        ));
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        fs::write(&path, b"not json").expect("write");
        assert!(matches!(load_model(&path), Err(ModelError::Serialization(_))));
    }
}
