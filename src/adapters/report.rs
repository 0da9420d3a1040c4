//! Single-patient CSV report export.
//!
//! A report is the history header plus exactly one row, written to
//! `<dir>/<Patient_Name>_report.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::HistoryRow;

/// Error type for report export.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] csv::Error),

    #[error("Failed to finish report: {0}")]
    Flush(String),
}

/// File name for a patient's report. Spaces and path separators become `_`.
#[must_use]
pub fn report_file_name(patient_name: &str) -> String {
    let safe: String = patient_name
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let safe = if safe.chars().all(|c| c == '.' || c == '_') {
        "Unknown".to_string()
    } else {
        safe
    };
    format!("{safe}_report.csv")
}

/// Serialize one row as a complete CSV document with header.
///
/// # Errors
/// Returns `Encode` if the row cannot be serialized.
pub fn report_bytes(row: &HistoryRow) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.serialize(row)?;
    writer
        .into_inner()
        .map_err(|e| ReportError::Flush(e.error().to_string()))
}

/// Writes patient reports into a fixed directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
}

impl ReportExporter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write `row` as a report, replacing any previous report for the same
    /// name. Returns the written path.
    ///
    /// # Errors
    /// Returns error if the directory or file cannot be written.
    pub fn export(&self, row: &HistoryRow) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(report_file_name(&row.name));
        fs::write(&path, report_bytes(row)?)?;
        tracing::info!("Exported report to {:?}", self.dir);
        Ok(path)
    }
}
