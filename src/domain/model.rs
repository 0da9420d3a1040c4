//! Fitted scale-then-classify pipeline.
//!
//! Standardization statistics and logistic regression weights fixed at
//! training time. Inference is closed-form and stateless:
//!
//! ```text
//! z_i = (x_i - mean_i) / scale_i
//! s   = intercept + Σ coef_i * z_i
//! p   = 1 / (1 + e^-s)
//! ```

use serde::{Deserialize, Serialize};

use super::diagnosis::Prediction;
use super::patient::{PatientFeatures, FEATURE_COUNT, FEATURE_NAMES};

/// Errors raised by the prediction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not found at {0}")]
    NotFound(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Feature order mismatch: model expects {expected:?}, application provides {actual:?}")]
    FeatureOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("Feature {0} is not a finite number")]
    NonFinite(&'static str),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Provenance recorded by the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainingMetadata {
    /// RFC 3339 time the model was fitted
    pub trained_at: String,
    /// SHA-256 of the training CSV
    pub dataset_sha256: String,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Accuracy on the held-out partition
    pub test_accuracy: f64,
    pub seed: u64,
}

/// Standardizer + logistic regression parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticPipeline {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    /// Per-feature standard deviation (1.0 for constant columns)
    pub scale: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub metadata: TrainingMetadata,
}

/// Contribution of one feature to the linear score.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContribution {
    pub feature: &'static str,
    pub value: f64,
    /// `coef * standardized value`; positive pushes towards disease
    pub contribution: f64,
}

fn sigmoid(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

impl LogisticPipeline {
    /// Build a pipeline over the application's feature order.
    ///
    /// # Errors
    /// Returns error if any parameter vector has the wrong length or a scale
    /// is not strictly positive.
    pub fn new(
        mean: Vec<f64>,
        scale: Vec<f64>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ModelError> {
        let pipeline = Self {
            feature_names: FEATURE_NAMES.iter().map(|n| (*n).to_string()).collect(),
            mean,
            scale,
            coefficients,
            intercept,
            metadata: TrainingMetadata::default(),
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Check parameter shapes and the column order.
    ///
    /// # Errors
    /// Returns `FeatureOrder` if the artifact was trained on a different
    /// column layout, `InvalidArtifact` for any other inconsistency.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::FeatureOrder {
                expected: self.feature_names.clone(),
                actual: FEATURE_NAMES.iter().map(|n| (*n).to_string()).collect(),
            });
        }

        for (name, len) in [
            ("mean", self.mean.len()),
            ("scale", self.scale.len()),
            ("coefficients", self.coefficients.len()),
        ] {
            if len != FEATURE_COUNT {
                return Err(ModelError::InvalidArtifact(format!(
                    "{name} has {len} entries, expected {FEATURE_COUNT}"
                )));
            }
        }

        let params = self
            .mean
            .iter()
            .chain(&self.scale)
            .chain(&self.coefficients)
            .chain(std::iter::once(&self.intercept));
        if params.into_iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "parameters must be finite".into(),
            ));
        }
        if self.scale.iter().any(|s| *s <= 0.0) {
            return Err(ModelError::InvalidArtifact(
                "scale entries must be positive".into(),
            ));
        }

        Ok(())
    }

    fn standardized(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut z = [0.0; FEATURE_COUNT];
        for (i, zi) in z.iter_mut().enumerate() {
            *zi = (x[i] - self.mean[i]) / self.scale[i];
        }
        z
    }

    /// Linear score before the logistic link.
    #[must_use]
    pub fn decision_function(&self, features: &PatientFeatures) -> f64 {
        let z = self.standardized(&features.to_array());
        self.intercept
            + z.iter()
                .zip(&self.coefficients)
                .map(|(zi, w)| zi * w)
                .sum::<f64>()
    }

    /// Predict label and positive-class probability.
    ///
    /// # Errors
    /// Returns `NonFinite` if any feature is NaN or infinite.
    pub fn predict(&self, features: &PatientFeatures) -> Result<Prediction, ModelError> {
        let x = features.to_array();
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite(FEATURE_NAMES[i]));
        }

        let probability = sigmoid(self.decision_function(features));
        Ok(Prediction::from_probability(probability))
    }

    /// Predict from an untyped vector in `FEATURE_NAMES` order.
    ///
    /// # Errors
    /// Returns `Shape` if the vector does not have `FEATURE_COUNT` entries.
    pub fn predict_vector(&self, x: &[f64]) -> Result<Prediction, ModelError> {
        let features = PatientFeatures::from_slice(x).map_err(|_| ModelError::Shape {
            expected: FEATURE_COUNT,
            actual: x.len(),
        })?;
        self.predict(&features)
    }

    /// Per-feature contributions to the score, largest magnitude first.
    ///
    /// For a linear model on standardized inputs these are exact: they sum
    /// with the intercept to `decision_function`.
    #[must_use]
    pub fn explain(&self, features: &PatientFeatures) -> Vec<FeatureContribution> {
        let x = features.to_array();
        let z = self.standardized(&x);

        let mut contributions: Vec<FeatureContribution> = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| FeatureContribution {
                feature: *name,
                value: x[i],
                contribution: self.coefficients[i] * z[i],
            })
            .collect();

        contributions.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        contributions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity scaling with weights only on resting BP and cholesterol.
    fn bp_chol_pipeline() -> LogisticPipeline {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[3] = 0.02;
        coefficients[4] = -0.01;
        LogisticPipeline::new(
            vec![0.0; FEATURE_COUNT],
            vec![1.0; FEATURE_COUNT],
            coefficients,
            0.0,
        )
        .expect("valid pipeline")
    }

    fn features(bp: f64, chol: f64) -> PatientFeatures {
        PatientFeatures {
            resting_bp: bp,
            cholesterol: chol,
            ..PatientFeatures::default()
        }
    }

    #[test]
    fn test_predict_is_deterministic() {
        let model = bp_chol_pipeline();
        let f = features(130.0, 250.0);
        let first = model.predict(&f).expect("predict");
        for _ in 0..5 {
            assert_eq!(model.predict(&f).expect("predict"), first);
        }
    }

    #[test]
    fn test_sigmoid_and_threshold() {
        let model = bp_chol_pipeline();
        // s = 0.02 * 200 - 0.01 * 100 = 3.0
        let p = model.predict(&features(200.0, 100.0)).expect("predict");
        assert!((p.probability - 1.0 / (1.0 + (-3.0f64).exp())).abs() < 1e-12);
        assert_eq!(p.label, 1);

        // s = 0.02 * 100 - 0.01 * 500 = -3.0
        let n = model.predict(&features(100.0, 500.0)).expect("predict");
        assert!(n.probability < 0.5);
        assert_eq!(n.label, 0);
    }

    #[test]
    fn test_swapped_columns_change_the_result() {
        let model = bp_chol_pipeline();
        let ordered = features(120.0, 240.0).to_array();
        let mut swapped = ordered;
        swapped.swap(3, 4);

        let a = model.predict_vector(&ordered).expect("predict");
        let b = model.predict_vector(&swapped).expect("predict");
        assert_ne!(a.probability, b.probability);
    }

    #[test]
    fn test_standardization_is_applied() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        mean[0] = 50.0;
        scale[0] = 10.0;
        coefficients[0] = 1.0;
        let model = LogisticPipeline::new(mean, scale, coefficients, 0.0).expect("valid");

        let at_mean = PatientFeatures {
            age: 50.0,
            ..PatientFeatures::default()
        };
        assert!(model.decision_function(&at_mean).abs() < 1e-12);

        let one_sd = PatientFeatures {
            age: 60.0,
            ..PatientFeatures::default()
        };
        assert!((model.decision_function(&one_sd) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_explain_sums_to_score() {
        let model = bp_chol_pipeline();
        let f = features(140.0, 300.0);
        let parts = model.explain(&f);

        assert_eq!(parts.len(), FEATURE_COUNT);
        assert_eq!(parts[0].feature, "chol");
        let total: f64 = parts.iter().map(|c| c.contribution).sum::<f64>() + model.intercept;
        assert!((total - model.decision_function(&f)).abs() < 1e-12);
    }

    #[test]
    fn test_shape_and_value_errors() {
        let model = bp_chol_pipeline();
        assert!(matches!(
            model.predict_vector(&[1.0; 12]),
            Err(ModelError::Shape { expected: 13, actual: 12 })
        ));
        let bad = PatientFeatures {
            st_depression: f64::NAN,
            ..PatientFeatures::default()
        };
        assert!(matches!(model.predict(&bad), Err(ModelError::NonFinite("oldpeak"))));
    }

    #[test]
    fn test_validate_rejects_reordered_columns() {
        let mut model = bp_chol_pipeline();
        model.feature_names.swap(3, 4);
        assert!(matches!(model.validate(), Err(ModelError::FeatureOrder { .. })));

        let mut model = bp_chol_pipeline();
        model.scale[2] = 0.0;
        assert!(matches!(model.validate(), Err(ModelError::InvalidArtifact(_))));
    }
}
