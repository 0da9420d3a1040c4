//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O: the categorical encoder, the patient record and
//! its feature vector, the fitted pipeline and how it is trained, prediction
//! results and history rows.

mod diagnosis;
pub mod encoding;
mod history;
mod model;
mod patient;
mod session;
pub mod training;

pub use diagnosis::{Prediction, RiskLevel, Verdict, DECISION_THRESHOLD};
pub use encoding::{
    Categorical, ChestPainType, EncodingError, ExerciseAngina, FastingBloodSugar, MajorVessels,
    RestingEcg, Sex, StSlope, Thalassemia,
};
pub use history::{HistoryRow, HistorySummary, HISTORY_HEADER, TIMESTAMP_FORMAT};
pub use model::{FeatureContribution, LogisticPipeline, ModelError, TrainingMetadata};
pub use patient::{
    PatientFeatures, PatientRecord, AGE_RANGE, CHOLESTEROL_RANGE, FEATURE_COUNT, FEATURE_NAMES,
    MAX_HEART_RATE_RANGE, RESTING_BP_RANGE, ST_DEPRESSION_RANGE, UNKNOWN_PATIENT,
};
pub use session::{AuthContext, AuthError, SessionToken};
pub use training::{LabelledSample, TrainingOptions, TrainingOutcome};
