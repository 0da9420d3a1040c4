//! Prediction result types.
//!
//! Represents the output of the logistic regression pipeline.

use serde::{Deserialize, Serialize};

/// Probability above which a prediction is positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Risk level classification for heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of heart disease
    #[serde(rename = "Low Risk")]
    Low,
    /// High risk, consultation recommended
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "No Heart Disease Detected",
            Self::High => "Positive for Heart Disease",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low Risk"),
            Self::High => write!(f, "High Risk"),
        }
    }
}

/// Yes/No rendering of the predicted label, as stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Yes,
    No,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// Result of the model prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub label: u8,

    /// Positive class probability (0.0 to 1.0)
    pub probability: f64,
}

impl Prediction {
    /// Create a prediction from the positive-class probability.
    ///
    /// The label is positive only when the probability is strictly above the
    /// threshold, which is the same as a strictly positive linear score.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        let label = u8::from(probability > DECISION_THRESHOLD);
        Self { label, probability }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }

    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        if self.is_positive() {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.is_positive() {
            Verdict::Yes
        } else {
            Verdict::No
        }
    }

    /// Probability as a percentage string with two decimals, e.g. `"73.00%"`.
    #[must_use]
    pub fn risk_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}
