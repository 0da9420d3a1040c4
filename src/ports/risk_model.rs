//! Risk model port: Trait for the trained classifier.
//!
//! This trait abstracts the fitted pipeline from the application logic.

use crate::domain::{FeatureContribution, LogisticPipeline, ModelError, PatientFeatures, Prediction};

/// A trained binary classifier over the 13 clinical features.
pub trait RiskModel: Send + Sync {
    /// Predict label and positive-class probability.
    ///
    /// Must be deterministic for a given model and input.
    ///
    /// # Errors
    /// Returns `ModelError` for malformed input.
    fn predict(&self, features: &PatientFeatures) -> Result<Prediction, ModelError>;

    /// Per-feature contributions to the prediction, largest first.
    fn explain(&self, features: &PatientFeatures) -> Vec<FeatureContribution>;
}

impl RiskModel for LogisticPipeline {
    fn predict(&self, features: &PatientFeatures) -> Result<Prediction, ModelError> {
        LogisticPipeline::predict(self, features)
    }

    fn explain(&self, features: &PatientFeatures) -> Vec<FeatureContribution> {
        LogisticPipeline::explain(self, features)
    }
}
