//! CSV adapter: Implementation of HistoryStore.
//!
//! Provides local persistence for prediction history as a plain CSV file
//! with the fixed header in `HISTORY_HEADER`.
//!
//! # Concurrency
//!
//! No file locking. Two processes appending to the same file at once may
//! interleave rows; a single writer at a time is assumed.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{HistoryRow, HISTORY_HEADER};
use crate::ports::HistoryStore;

/// Error type for history operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed history file at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Failed to write history row: {0}")]
    Write(String),
}

impl HistoryError {
    fn from_read(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Self::Io(e),
            _ => Self::Parse { line, message },
        }
    }

    fn from_write(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Self::Io(e),
            _ => Self::Write(message),
        }
    }
}

/// CSV file history store.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file is not touched until the first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

}

impl HistoryStore for CsvHistoryStore {
    type Error = HistoryError;

    fn append(&self, row: &HistoryRow) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(row).map_err(HistoryError::from_write)?;
        writer.flush()?;

        if needs_header {
            tracing::info!("Created history file at {:?}", self.path);
        }
        tracing::debug!("Appended history row");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryRow>, Self::Error> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers().map_err(HistoryError::from_read)?.clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        if headers.iter().ne(HISTORY_HEADER) {
            return Err(HistoryError::Parse {
                line: 1,
                message: format!(
                    "unexpected header {:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            });
        }

        reader
            .deserialize::<HistoryRow>()
            .map(|row| row.map_err(HistoryError::from_read))
            .collect()
    }

    fn clear(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::warn!("Cleared prediction history at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ChestPainType, PatientRecord, Prediction, Sex, Thalassemia, TIMESTAMP_FORMAT,
    };
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn row(name: &str, probability: f64, oldpeak: f64) -> HistoryRow {
        let record = PatientRecord {
            name: name.into(),
            sex: Sex::Female,
            chest_pain: ChestPainType::NonAnginalPain,
            thalassemia: Thalassemia::ReversibleDefect,
            st_depression: oldpeak,
            ..PatientRecord::default()
        };
        let at = NaiveDateTime::parse_from_str("2025-06-01 12:30:45", TIMESTAMP_FORMAT)
            .expect("timestamp");
        HistoryRow::new(&record, &Prediction::from_probability(probability), at)
    }

    #[test]
    fn test_absent_file_reads_empty() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        assert!(store.read_all().expect("read").is_empty());
        assert!(store.tail(10).expect("tail").is_empty());
        store.clear().expect("clearing an absent store is a no-op");
    }

    #[test]
    fn test_append_then_read_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));

        let first = row("Alice Smith", 0.73, 1.0);
        let second = row("Bob, Jr.", 0.4012, 2.3);
        store.append(&first).expect("append");
        store.append(&second).expect("append");

        let rows = store.read_all().expect("read");
        assert_eq!(rows, vec![first, second.clone()]);
        assert_eq!(rows.last(), Some(&second));

        let content = std::fs::read_to_string(store.path()).expect("read file");
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(HISTORY_HEADER.join(",").as_str()));
        assert_eq!(content.matches("Name,Age").count(), 1);
        assert!(content.contains("Non-anginal Pain"));
        assert!(content.contains("73.00%"));
        assert!(content.contains("2025-06-01 12:30:45"));
        assert!(content.contains("\"Bob, Jr.\""));
    }

    #[test]
    fn test_read_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        store.append(&row("Alice", 0.9, 0.5)).expect("append");

        let a = store.read_all().expect("read");
        let b = store.read_all().expect("read");
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear_then_append_recreates_header() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        store.append(&row("Alice", 0.9, 0.5)).expect("append");

        store.clear().expect("clear");
        assert!(!store.path().exists());
        assert!(store.read_all().expect("read").is_empty());

        store.append(&row("Bob", 0.2, 0.0)).expect("append");
        let content = std::fs::read_to_string(store.path()).expect("read file");
        assert!(content.starts_with("Name,Age,Sex"));
        assert_eq!(store.read_all().expect("read").len(), 1);
    }

    #[test]
    fn test_filter_and_tail() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("nested/dir/history.csv"));
        for name in ["Alice", "Bob", "MALICE", "Carol"] {
            store.append(&row(name, 0.6, 1.0)).expect("append");
        }

        let names = |rows: Vec<HistoryRow>| rows.into_iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(
            names(store.filter_by_name_substring("lice").expect("filter")),
            vec!["Alice", "MALICE"]
        );
        assert_eq!(names(store.tail(2).expect("tail")), vec!["MALICE", "Carol"]);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        let store = CsvHistoryStore::new(&path);
        store.append(&row("Alice", 0.9, 0.5)).expect("append");

        let mut content = std::fs::read_to_string(&path).expect("read file");
        content.push_str("Mallory,not-a-number\n");
        std::fs::write(&path, content).expect("write file");

        match store.read_all() {
            Err(HistoryError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(!message.is_empty());
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_quoted_unicode_and_float_precision_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));

        let quoted = row("Zoë \"Z\" Ünïcode,\nsecond line", 0.500_000_000_1, 0.300_000_000_000_000_04);
        let plain = row("Carol", 0.1, 0.0);
        store.append(&quoted).expect("append");
        store.append(&plain).expect("append");

        let rows = store.read_all().expect("read");
        assert_eq!(rows, vec![quoted, plain]);
        assert_eq!(rows[0].st_depression.to_bits(), 0.300_000_000_000_000_04_f64.to_bits());
        assert_eq!(rows[0].name, "Zoë \"Z\" Ünïcode,\nsecond line");
    }

    #[test]
    fn test_foreign_header_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "Name,Age\nAlice,40\n").expect("write file");

        let store = CsvHistoryStore::new(&path);
        assert!(matches!(
            store.read_all(),
            Err(HistoryError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_category_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        let store = CsvHistoryStore::new(&path);
        store.append(&row("Alice", 0.9, 0.5)).expect("append");

        let content = std::fs::read_to_string(&path)
            .expect("read file")
            .replace("Female", "Other");
        std::fs::write(&path, content).expect("write file");

        assert!(matches!(store.read_all(), Err(HistoryError::Parse { .. })));
    }
}
