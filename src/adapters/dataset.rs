//! Labelled training dataset (`heart.csv`).
//!
//! Columns are matched by header name, so extra columns and a different
//! column order are accepted. `target` must be 0 or 1.

use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::{LabelledSample, FEATURE_COUNT};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Line {line}: target must be 0 or 1, got {value}")]
    Target { line: u64, value: f64 },

    #[error("Dataset has no rows")]
    Empty,
}

/// Samples plus the digest of the exact bytes they were read from.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub samples: Vec<LabelledSample>,
    /// Lowercase hex SHA-256 of the file
    pub sha256: String,
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    age: f64,
    sex: f64,
    cp: f64,
    trestbps: f64,
    chol: f64,
    fbs: f64,
    restecg: f64,
    thalach: f64,
    exang: f64,
    oldpeak: f64,
    slope: f64,
    ca: f64,
    thal: f64,
    target: f64,
}

impl DatasetRow {
    fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Read and validate the dataset.
///
/// # Errors
/// Returns error if the file cannot be read, a row does not parse, a target
/// is not 0/1, or there are no rows.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let bytes = std::fs::read(path)?;
    let sha256 = to_hex(&Sha256::digest(&bytes));

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut samples = Vec::new();
    for result in reader.deserialize::<DatasetRow>() {
        let row = result.map_err(|err| DatasetError::Parse {
            line: err.position().map_or(0, csv::Position::line),
            message: err.to_string(),
        })?;
        // Header is line 1
        let line = samples.len() as u64 + 2;
        let target = match row.target {
            t if t == 0.0 => 0,
            t if t == 1.0 => 1,
            value => return Err(DatasetError::Target { line, value }),
        };
        samples.push(LabelledSample {
            features: row.features(),
            target,
        });
    }

    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }

    tracing::info!("Loaded {} labelled rows from {}", samples.len(), path.display());
    Ok(Dataset { samples, sha256 })
}
