//! History service: browse, search, summarize and clear past predictions.

use std::sync::Arc;

use crate::domain::{AuthContext, HistoryRow, HistorySummary};
use crate::ports::{last_n, HistoryStore};
use crate::HeartcheckError;

/// Default number of rows shown as "recent".
pub const DEFAULT_TAIL: usize = 10;

/// Service for reading and managing the prediction history.
pub struct HistoryService<H: HistoryStore> {
    store: Arc<H>,
    tail: usize,
}

impl<H> HistoryService<H>
where
    H: HistoryStore,
    H::Error: Into<HeartcheckError>,
{
    pub fn new(store: Arc<H>, tail: usize) -> Self {
        Self { store, tail }
    }

    /// Number of rows `recent` returns.
    #[must_use]
    pub fn tail_len(&self) -> usize {
        self.tail
    }

    /// The last `tail_len()` rows in store order.
    ///
    /// # Errors
    /// Returns error if the store is unreadable or malformed.
    pub fn recent(&self, _ctx: &AuthContext) -> Result<Vec<HistoryRow>, HeartcheckError> {
        self.store.tail(self.tail).map_err(Into::into)
    }

    /// The last `tail_len()` rows whose patient name contains `query`,
    /// ignoring case.
    ///
    /// # Errors
    /// Returns error if the store is unreadable or malformed.
    pub fn search(
        &self,
        _ctx: &AuthContext,
        query: &str,
    ) -> Result<Vec<HistoryRow>, HeartcheckError> {
        let rows = self
            .store
            .filter_by_name_substring(query)
            .map_err(Into::into)?;
        tracing::debug!("History search matched {} row(s)", rows.len());
        Ok(last_n(rows, self.tail))
    }

    /// Yes/No counts over the whole history.
    ///
    /// # Errors
    /// Returns error if the store is unreadable or malformed.
    pub fn summary(&self, _ctx: &AuthContext) -> Result<HistorySummary, HeartcheckError> {
        let rows = self.store.read_all().map_err(Into::into)?;
        Ok(HistorySummary::from_rows(&rows))
    }

    /// Delete the whole history. Irreversible.
    ///
    /// # Errors
    /// Returns error if the store cannot be removed.
    pub fn clear(&self, ctx: &AuthContext) -> Result<(), HeartcheckError> {
        self.store.clear().map_err(Into::into)?;
        tracing::warn!(user = %ctx.username, "Prediction history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CsvHistoryStore, InMemoryHistoryStore};
    use crate::domain::{PatientRecord, Prediction, SessionToken};
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    fn ctx() -> AuthContext {
        AuthContext {
            username: "admin".into(),
            token: SessionToken::new("ab".repeat(32)),
            issued_at: Utc::now(),
        }
    }

    fn row(name: &str, probability: f64) -> HistoryRow {
        let at = NaiveDate::from_ymd_opt(2025, 2, 3)
            .and_then(|d| d.and_hms_opt(4, 5, 6))
            .expect("valid timestamp");
        let record = PatientRecord {
            name: name.into(),
            ..PatientRecord::default()
        };
        HistoryRow::new(&record, &Prediction::from_probability(probability), at)
    }

    fn seeded<H: HistoryStore>(store: &H, n: usize)
    where
        H::Error: std::fmt::Debug,
    {
        for i in 0..n {
            let p = if i % 3 == 0 { 0.8 } else { 0.3 };
            store.append(&row(&format!("Patient {i}"), p)).expect("append");
        }
    }

    #[test]
    fn test_recent_returns_last_rows() {
        let store = Arc::new(InMemoryHistoryStore::new());
        seeded(store.as_ref(), 15);
        let service = HistoryService::new(store, DEFAULT_TAIL);

        let recent = service.recent(&ctx()).expect("recent");
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].name, "Patient 5");
        assert_eq!(recent[9].name, "Patient 14");
    }

    #[test]
    fn test_search_and_summary() {
        let store = Arc::new(InMemoryHistoryStore::new());
        seeded(store.as_ref(), 12);
        let service = HistoryService::new(store, DEFAULT_TAIL);

        let hits = service.search(&ctx(), "patient 1").expect("search");
        let names: Vec<_> = hits.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Patient 1", "Patient 10", "Patient 11"]);

        let everything = service.search(&ctx(), "").expect("search");
        assert_eq!(everything.len(), DEFAULT_TAIL);
        assert_eq!(everything[0].name, "Patient 2");
        assert_eq!(everything[9].name, "Patient 11");

        let summary = service.summary(&ctx()).expect("summary");
        assert_eq!(summary.total, 12);
        assert_eq!(summary.positive, 4);
        assert_eq!(summary.negative, 8);
    }

    #[test]
    fn test_clear_csv_history() {
        let dir = tempdir().expect("tempdir");
        let store = Arc::new(CsvHistoryStore::new(dir.path().join("history.csv")));
        seeded(store.as_ref(), 3);
        let service = HistoryService::new(store.clone(), DEFAULT_TAIL);

        service.clear(&ctx()).expect("clear");
        assert!(!store.path().exists());
        assert!(store.read_all().expect("read").is_empty());
        assert_eq!(service.summary(&ctx()).expect("summary").positive_pct(), 0.0);
    }

    #[test]
    fn test_malformed_csv_surfaces_history_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "garbage\n1,2\n").expect("write");
        let service = HistoryService::new(Arc::new(CsvHistoryStore::new(&path)), DEFAULT_TAIL);

        assert!(matches!(
            service.recent(&ctx()),
            Err(HeartcheckError::History(_))
        ));
    }
}
