//! History rows: one immutable record per prediction.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::diagnosis::{Prediction, RiskLevel, Verdict};
use super::encoding::{
    ChestPainType, ExerciseAngina, FastingBloodSugar, MajorVessels, RestingEcg, Sex, StSlope,
    Thalassemia,
};
use super::patient::PatientRecord;

/// Timestamp format used in the history file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header row of the history file, in column order.
pub const HISTORY_HEADER: [&str; 18] = [
    "Name",
    "Age",
    "Sex",
    "Chest Pain Type",
    "Resting BP",
    "Cholesterol",
    "Fasting Sugar",
    "Rest ECG",
    "Max HR",
    "Exercise Angina",
    "ST Depression",
    "Slope",
    "Major Vessels",
    "Thalassemia",
    "Prediction",
    "Risk Level",
    "Risk %",
    "Timestamp",
];

/// One persisted prediction.
///
/// Field order is the column order of `HISTORY_HEADER`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Sex")]
    pub sex: Sex,
    #[serde(rename = "Chest Pain Type")]
    pub chest_pain: ChestPainType,
    #[serde(rename = "Resting BP")]
    pub resting_bp: u32,
    #[serde(rename = "Cholesterol")]
    pub cholesterol: u32,
    #[serde(rename = "Fasting Sugar")]
    pub fasting_sugar: FastingBloodSugar,
    #[serde(rename = "Rest ECG")]
    pub rest_ecg: RestingEcg,
    #[serde(rename = "Max HR")]
    pub max_heart_rate: u32,
    #[serde(rename = "Exercise Angina")]
    pub exercise_angina: ExerciseAngina,
    #[serde(rename = "ST Depression")]
    pub st_depression: f64,
    #[serde(rename = "Slope")]
    pub slope: StSlope,
    #[serde(rename = "Major Vessels")]
    pub major_vessels: MajorVessels,
    #[serde(rename = "Thalassemia")]
    pub thalassemia: Thalassemia,
    #[serde(rename = "Prediction")]
    pub prediction: Verdict,
    #[serde(rename = "Risk Level")]
    pub risk_level: RiskLevel,
    #[serde(rename = "Risk %")]
    pub risk_percent: String,
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

impl HistoryRow {
    /// Build the row for a prediction made at `at`.
    ///
    /// Sub-second precision is dropped so the row reads back unchanged.
    #[must_use]
    pub fn new(record: &PatientRecord, prediction: &Prediction, at: NaiveDateTime) -> Self {
        Self {
            name: record.display_name().to_string(),
            age: record.age,
            sex: record.sex,
            chest_pain: record.chest_pain,
            resting_bp: record.resting_bp,
            cholesterol: record.cholesterol,
            fasting_sugar: record.fasting_sugar,
            rest_ecg: record.rest_ecg,
            max_heart_rate: record.max_heart_rate,
            exercise_angina: record.exercise_angina,
            st_depression: record.st_depression,
            slope: record.slope,
            major_vessels: record.major_vessels,
            thalassemia: record.thalassemia,
            prediction: prediction.verdict(),
            risk_level: prediction.risk_level(),
            risk_percent: prediction.risk_percent(),
            timestamp: at.with_nanosecond(0).unwrap_or(at),
        }
    }

    /// Case-insensitive substring match on the patient name.
    #[must_use]
    pub fn name_contains(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Yes/No counts over a set of history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

impl HistorySummary {
    #[must_use]
    pub fn from_rows(rows: &[HistoryRow]) -> Self {
        let positive = rows
            .iter()
            .filter(|r| r.prediction == Verdict::Yes)
            .count();
        Self {
            total: rows.len(),
            positive,
            negative: rows.len() - positive,
        }
    }

    /// Share of positive predictions in percent, 0 for an empty history.
    #[must_use]
    pub fn positive_pct(&self) -> f64 {
        percent(self.positive, self.total)
    }

    #[must_use]
    pub fn negative_pct(&self) -> f64 {
        percent(self.negative, self.total)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_milli_opt(9, 26, 53, 589))
            .expect("valid timestamp")
    }

    #[test]
    fn test_row_from_prediction() {
        let record = PatientRecord {
            name: String::new(),
            ..PatientRecord::default()
        };
        let row = HistoryRow::new(&record, &Prediction::from_probability(0.73), at());

        assert_eq!(row.name, "Unknown");
        assert_eq!(row.prediction, Verdict::Yes);
        assert_eq!(row.risk_level, RiskLevel::High);
        assert_eq!(row.risk_percent, "73.00%");
        assert_eq!(row.timestamp.nanosecond(), 0);
        assert_eq!(row.timestamp.format(TIMESTAMP_FORMAT).to_string(), "2025-03-14 09:26:53");
    }

    #[test]
    fn test_name_contains_ignores_case() {
        let mut row = HistoryRow::new(
            &PatientRecord::default(),
            &Prediction::from_probability(0.1),
            at(),
        );
        for name in ["Alice", "MALICE"] {
            row.name = name.into();
            assert!(row.name_contains("lice"));
        }
        row.name = "Bob".into();
        assert!(!row.name_contains("lice"));
        assert!(row.name_contains(""));
    }

    #[test]
    fn test_summary_counts_and_percentages() {
        let record = PatientRecord::default();
        let rows: Vec<HistoryRow> = [0.9, 0.2, 0.7, 0.6]
            .iter()
            .map(|p| HistoryRow::new(&record, &Prediction::from_probability(*p), at()))
            .collect();

        let summary = HistorySummary::from_rows(&rows);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.positive, 3);
        assert_eq!(summary.negative, 1);
        assert!((summary.positive_pct() - 75.0).abs() < 1e-12);
        assert!((summary.negative_pct() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary_has_zero_percentages() {
        let summary = HistorySummary::from_rows(&[]);
        assert_eq!(summary, HistorySummary::default());
        assert_eq!(summary.positive_pct(), 0.0);
        assert_eq!(summary.negative_pct(), 0.0);
    }
}
