//! Prediction service: validate, encode, predict, record.
//!
//! Every submission goes through the same steps:
//! 1. Range-check the form values
//! 2. Encode the record into the model's feature layout
//! 3. Predict and explain
//! 4. Append one row to the history store

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::domain::{AuthContext, FeatureContribution, HistoryRow, PatientRecord, Prediction};
use crate::ports::{HistoryStore, RiskModel};
use crate::HeartcheckError;

/// Outcome of one submission.
#[derive(Debug, Clone)]
pub struct Assessment {
    /// The row as written to history
    pub row: HistoryRow,
    pub prediction: Prediction,
    /// Per-feature contributions, largest magnitude first
    pub contributions: Vec<FeatureContribution>,
}

/// Service for running the risk model and recording results.
pub struct PredictionService<M, H>
where
    M: RiskModel,
    H: HistoryStore,
{
    model: Arc<M>,
    history: Arc<H>,
}

impl<M, H> PredictionService<M, H>
where
    M: RiskModel,
    H: HistoryStore,
    H::Error: Into<HeartcheckError>,
{
    /// Create a new prediction service.
    pub fn new(model: Arc<M>, history: Arc<H>) -> Self {
        Self { model, history }
    }

    /// Assess a patient and record the result at the current local time.
    ///
    /// # Errors
    /// Returns `Validation` for out-of-range fields, a model error for
    /// non-finite input, or a history error if the row cannot be appended.
    pub fn assess(
        &self,
        ctx: &AuthContext,
        record: &PatientRecord,
    ) -> Result<Assessment, HeartcheckError> {
        self.assess_at(ctx, record, Local::now().naive_local())
    }

    /// Same as `assess` with an explicit timestamp.
    ///
    /// # Errors
    /// See `assess`.
    pub fn assess_at(
        &self,
        ctx: &AuthContext,
        record: &PatientRecord,
        at: NaiveDateTime,
    ) -> Result<Assessment, HeartcheckError> {
        record
            .validate()
            .map_err(|errors| HeartcheckError::Validation(errors.join("; ")))?;

        let features = record.features();
        let prediction = self.model.predict(&features)?;
        let contributions = self.model.explain(&features);

        let row = HistoryRow::new(record, &prediction, at);
        self.history.append(&row).map_err(Into::into)?;

        tracing::info!(
            user = %ctx.username,
            "Assessment recorded: prediction={}, probability={:.4}, risk={}",
            row.prediction,
            prediction.probability,
            row.risk_level
        );

        Ok(Assessment {
            row,
            prediction,
            contributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryHistoryStore;
    use crate::domain::{
        LogisticPipeline, RiskLevel, SessionToken, Verdict, FEATURE_COUNT, UNKNOWN_PATIENT,
    };
    use chrono::{NaiveDate, Utc};

    fn ctx() -> AuthContext {
        AuthContext {
            username: "admin".into(),
            token: SessionToken::new("00".repeat(32)),
            issued_at: Utc::now(),
        }
    }

    /// Positive iff cholesterol is above 250.
    fn cholesterol_model() -> LogisticPipeline {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        mean[4] = 250.0;
        coefficients[4] = 0.05;
        LogisticPipeline::new(mean, vec![1.0; FEATURE_COUNT], coefficients, 0.0).expect("valid")
    }

    fn service() -> (
        PredictionService<LogisticPipeline, InMemoryHistoryStore>,
        Arc<InMemoryHistoryStore>,
    ) {
        let history = Arc::new(InMemoryHistoryStore::new());
        let service = PredictionService::new(Arc::new(cholesterol_model()), history.clone());
        (service, history)
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .and_then(|d| d.and_hms_opt(7, 8, 9))
            .expect("valid timestamp")
    }

    #[test]
    fn test_assessment_is_recorded() {
        let (service, history) = service();
        let record = PatientRecord {
            name: "  ".into(),
            cholesterol: 300,
            ..PatientRecord::default()
        };

        let assessment = service.assess_at(&ctx(), &record, at()).expect("assess");
        assert_eq!(assessment.prediction.label, 1);
        assert_eq!(assessment.row.name, UNKNOWN_PATIENT);
        assert_eq!(assessment.row.prediction, Verdict::Yes);
        assert_eq!(assessment.row.risk_level, RiskLevel::High);
        assert_eq!(assessment.contributions[0].feature, "chol");

        let rows = history.read_all().expect("read");
        assert_eq!(rows, vec![assessment.row]);
    }

    #[test]
    fn test_low_risk_assessment() {
        let (service, _) = service();
        let record = PatientRecord {
            name: "Bob".into(),
            cholesterol: 180,
            ..PatientRecord::default()
        };
        let assessment = service.assess_at(&ctx(), &record, at()).expect("assess");
        assert_eq!(assessment.row.prediction, Verdict::No);
        assert_eq!(assessment.row.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_out_of_range_record_is_not_recorded() {
        let (service, history) = service();
        let record = PatientRecord {
            age: 0,
            resting_bp: 250,
            ..PatientRecord::default()
        };

        match service.assess_at(&ctx(), &record, at()) {
            Err(HeartcheckError::Validation(msg)) => {
                assert!(msg.contains("Age"));
                assert!(msg.contains("Resting BP"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(history.is_empty());
    }
}
