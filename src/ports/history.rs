//! History port: Trait for the append-only prediction log.
//!
//! This trait abstracts the storage backend (CSV file) from the application
//! logic so services can run against an in-memory double in tests.

use crate::domain::HistoryRow;

/// Append-only store of past predictions.
///
/// Rows are returned in the order they were appended. There is no locking:
/// at most one writer is expected at a time.
pub trait HistoryStore {
    /// Error type for history operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one row, creating the store (with header) if absent.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    fn append(&self, row: &HistoryRow) -> Result<(), Self::Error>;

    /// Read every row, top to bottom.
    ///
    /// An absent store reads as empty.
    ///
    /// # Errors
    /// Returns a parse error if the store is malformed.
    fn read_all(&self) -> Result<Vec<HistoryRow>, Self::Error>;

    /// Delete the whole store. Irreversible.
    ///
    /// # Errors
    /// Returns error if the store exists but cannot be removed.
    fn clear(&self) -> Result<(), Self::Error>;

    /// Rows whose name contains `query`, ignoring case, in store order.
    ///
    /// # Errors
    /// Propagates `read_all` errors.
    fn filter_by_name_substring(&self, query: &str) -> Result<Vec<HistoryRow>, Self::Error> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|row| row.name_contains(query))
            .collect())
    }

    /// The last `n` rows, in store order.
    ///
    /// # Errors
    /// Propagates `read_all` errors.
    fn tail(&self, n: usize) -> Result<Vec<HistoryRow>, Self::Error> {
        Ok(last_n(self.read_all()?, n))
    }
}

/// Keep the last `n` elements of `rows`.
#[must_use]
pub fn last_n<T>(mut rows: Vec<T>, n: usize) -> Vec<T> {
    let skip = rows.len().saturating_sub(n);
    rows.drain(..skip);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_n() {
        assert_eq!(last_n(vec![1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(last_n(vec![1, 2], 10), vec![1, 2]);
        assert!(last_n(vec![1, 2], 0).is_empty());
        assert!(last_n(Vec::<u8>::new(), 3).is_empty());
    }
}
