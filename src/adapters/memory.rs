//! In-memory history store.
//!
//! Used by service tests and as a scratch backend when no history file
//! should be written.

use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use crate::domain::HistoryRow;
use crate::ports::HistoryStore;

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    rows: Mutex<Vec<HistoryRow>>,
}

impl InMemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for InMemoryHistoryStore {
    type Error = Infallible;

    fn append(&self, row: &HistoryRow) -> Result<(), Self::Error> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryRow>, Self::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
