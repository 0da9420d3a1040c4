//! Patient data types for heart disease risk prediction.
//!
//! Based on the UCI Cleveland heart disease features (13 clinical columns).

use serde::{Deserialize, Serialize};

use super::encoding::{
    Categorical, ChestPainType, ExerciseAngina, FastingBloodSugar, MajorVessels, RestingEcg, Sex,
    StSlope, Thalassemia,
};

/// Name recorded when the form's name field is left blank.
pub const UNKNOWN_PATIENT: &str = "Unknown";

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 13;

/// Model column order. Must match the order used at training time.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Inclusive bounds for the numeric form fields.
pub const AGE_RANGE: (u32, u32) = (1, 120);
pub const RESTING_BP_RANGE: (u32, u32) = (80, 200);
pub const CHOLESTEROL_RANGE: (u32, u32) = (100, 600);
pub const MAX_HEART_RATE_RANGE: (u32, u32) = (60, 220);
pub const ST_DEPRESSION_RANGE: (f64, f64) = (0.0, 6.0);

/// One form submission: patient name plus the 13 clinical fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub chest_pain: ChestPainType,
    /// Resting blood pressure in mm Hg (trestbps)
    pub resting_bp: u32,
    /// Serum cholesterol in mg/dl (chol)
    pub cholesterol: u32,
    pub fasting_sugar: FastingBloodSugar,
    pub rest_ecg: RestingEcg,
    /// Maximum heart rate achieved (thalach)
    pub max_heart_rate: u32,
    pub exercise_angina: ExerciseAngina,
    /// ST depression induced by exercise relative to rest (oldpeak)
    pub st_depression: f64,
    pub slope: StSlope,
    pub major_vessels: MajorVessels,
    pub thalassemia: Thalassemia,
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: 30,
            sex: Sex::Male,
            chest_pain: ChestPainType::TypicalAngina,
            resting_bp: 120,
            cholesterol: 200,
            fasting_sugar: FastingBloodSugar::Yes,
            rest_ecg: RestingEcg::Normal,
            max_heart_rate: 150,
            exercise_angina: ExerciseAngina::Yes,
            st_depression: 1.0,
            slope: StSlope::Upsloping,
            major_vessels: MajorVessels::Zero,
            thalassemia: Thalassemia::Normal,
        }
    }
}

impl PatientRecord {
    /// Name to record, substituting the sentinel for blank input.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            UNKNOWN_PATIENT
        } else {
            trimmed
        }
    }

    /// Encode the record into the model's feature layout.
    ///
    /// This is the single place where form fields are mapped to model columns.
    #[must_use]
    pub fn features(&self) -> PatientFeatures {
        PatientFeatures {
            age: f64::from(self.age),
            sex: f64::from(self.sex.code()),
            chest_pain: f64::from(self.chest_pain.code()),
            resting_bp: f64::from(self.resting_bp),
            cholesterol: f64::from(self.cholesterol),
            fasting_sugar: f64::from(self.fasting_sugar.code()),
            rest_ecg: f64::from(self.rest_ecg.code()),
            max_heart_rate: f64::from(self.max_heart_rate),
            exercise_angina: f64::from(self.exercise_angina.code()),
            st_depression: self.st_depression,
            slope: f64::from(self.slope.code()),
            major_vessels: f64::from(self.major_vessels.code()),
            thalassemia: f64::from(self.thalassemia.code()),
        }
    }

    /// Validate that all numeric fields are within the form's bounds.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_range(&mut errors, "Age", self.age, AGE_RANGE);
        check_range(&mut errors, "Resting BP", self.resting_bp, RESTING_BP_RANGE);
        check_range(&mut errors, "Cholesterol", self.cholesterol, CHOLESTEROL_RANGE);
        check_range(&mut errors, "Max HR", self.max_heart_rate, MAX_HEART_RATE_RANGE);

        let (lo, hi) = ST_DEPRESSION_RANGE;
        if !self.st_depression.is_finite() || !(lo..=hi).contains(&self.st_depression) {
            errors.push(format!(
                "ST depression {} out of range [{lo}, {hi}]",
                self.st_depression
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_range(errors: &mut Vec<String>, label: &str, value: u32, (lo, hi): (u32, u32)) {
    if !(lo..=hi).contains(&value) {
        errors.push(format!("{label} {value} out of range [{lo}, {hi}]"));
    }
}

/// Encoded model input with one named field per column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PatientFeatures {
    pub age: f64,
    pub sex: f64,
    pub chest_pain: f64,
    pub resting_bp: f64,
    pub cholesterol: f64,
    pub fasting_sugar: f64,
    pub rest_ecg: f64,
    pub max_heart_rate: f64,
    pub exercise_angina: f64,
    pub st_depression: f64,
    pub slope: f64,
    pub major_vessels: f64,
    pub thalassemia: f64,
}

impl PatientFeatures {
    /// Convert features to the ordered model input.
    /// Order matches `FEATURE_NAMES`.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.chest_pain,
            self.resting_bp,
            self.cholesterol,
            self.fasting_sugar,
            self.rest_ecg,
            self.max_heart_rate,
            self.exercise_angina,
            self.st_depression,
            self.slope,
            self.major_vessels,
            self.thalassemia,
        ]
    }

    /// Create features from an ordered slice.
    ///
    /// # Errors
    /// Returns error if the slice length is not `FEATURE_COUNT`.
    pub fn from_slice(v: &[f64]) -> Result<Self, String> {
        if v.len() != FEATURE_COUNT {
            return Err(format!(
                "Expected {FEATURE_COUNT} features, got {}",
                v.len()
            ));
        }

        Ok(Self {
            age: v[0],
            sex: v[1],
            chest_pain: v[2],
            resting_bp: v[3],
            cholesterol: v[4],
            fasting_sugar: v[5],
            rest_ecg: v[6],
            max_heart_rate: v[7],
            exercise_angina: v[8],
            st_depression: v[9],
            slope: v[10],
            major_vessels: v[11],
            thalassemia: v[12],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PatientRecord {
        PatientRecord {
            name: "Alice".into(),
            age: 63,
            sex: Sex::Female,
            chest_pain: ChestPainType::Asymptomatic,
            resting_bp: 145,
            cholesterol: 233,
            fasting_sugar: FastingBloodSugar::Yes,
            rest_ecg: RestingEcg::LeftVentricularHypertrophy,
            max_heart_rate: 150,
            exercise_angina: ExerciseAngina::No,
            st_depression: 2.3,
            slope: StSlope::Downsloping,
            major_vessels: MajorVessels::Two,
            thalassemia: Thalassemia::FixedDefect,
        }
    }

    #[test]
    fn test_features_follow_training_column_order() {
        let v = sample_record().features().to_array();
        assert_eq!(
            v,
            [63.0, 0.0, 3.0, 145.0, 233.0, 1.0, 2.0, 150.0, 0.0, 2.3, 2.0, 2.0, 2.0]
        );
        assert_eq!(FEATURE_NAMES[3], "trestbps");
        assert_eq!(FEATURE_NAMES[4], "chol");
    }

    #[test]
    fn test_features_from_slice() {
        let v = sample_record().features().to_array();
        let features = PatientFeatures::from_slice(&v).expect("Should parse");
        assert_eq!(features, sample_record().features());
        assert!(PatientFeatures::from_slice(&v[..12]).is_err());
    }

    #[test]
    fn test_blank_name_becomes_unknown() {
        let mut record = sample_record();
        record.name = "   ".into();
        assert_eq!(record.display_name(), UNKNOWN_PATIENT);
        record.name = " Bob ".into();
        assert_eq!(record.display_name(), "Bob");
    }

    #[test]
    fn test_validation() {
        assert!(sample_record().validate().is_ok());
        assert!(PatientRecord::default().validate().is_ok());

        let invalid = PatientRecord {
            age: 0,
            resting_bp: 250,
            st_depression: 6.5,
            ..sample_record()
        };
        let errors = invalid.validate().expect_err("three fields out of range");
        assert_eq!(errors.len(), 3);
    }
}
