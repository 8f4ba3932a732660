//! Occurrence row storage.
//!
//! The engine only needs the contract "store and retrieve occurrence rows
//! by id / series id"; everything else about persistence is somebody
//! else's problem. `MemoryStore` is the reference implementation and backs
//! the tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use cadence_core::error::{CadenceError, CadenceResult};
use cadence_core::event::{EventOccurrence, OccurrenceUpdate};

/// Storage contract for occurrence rows.
///
/// `insert_batch` is all-or-nothing: a series is created as one logical
/// unit, and readers must never observe a partially written batch.
pub trait OccurrenceStore: Send + Sync + 'static {
    fn insert(&self, row: EventOccurrence) -> CadenceResult<EventOccurrence>;

    /// Insert every row or none of them.
    fn insert_batch(&self, rows: Vec<EventOccurrence>) -> CadenceResult<()>;

    /// Look up a live (not soft-deleted) row.
    fn find_by_id(&self, id: &str) -> CadenceResult<Option<EventOccurrence>>;

    /// All live rows of a series, ordered by start time.
    fn find_by_series(&self, series_id: &str) -> CadenceResult<Vec<EventOccurrence>>;

    /// Apply a partial update to one live row; returns the updated row.
    fn update(&self, id: &str, fields: &OccurrenceUpdate) -> CadenceResult<Option<EventOccurrence>>;

    /// Mark one row deleted; returns whether a live row existed.
    fn soft_delete(&self, id: &str) -> CadenceResult<bool>;
}

/// In-memory store. Batch inserts are atomic by construction: every
/// operation runs under one lock.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, EventOccurrence>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> CadenceResult<std::sync::MutexGuard<'_, HashMap<String, EventOccurrence>>> {
        self.rows
            .lock()
            .map_err(|_| CadenceError::Storage("occurrence store lock poisoned".to_string()))
    }
}

impl OccurrenceStore for MemoryStore {
    fn insert(&self, row: EventOccurrence) -> CadenceResult<EventOccurrence> {
        let mut rows = self.lock()?;
        if rows.contains_key(&row.id) {
            return Err(CadenceError::Storage(format!(
                "duplicate occurrence id: {}",
                row.id
            )));
        }
        rows.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    fn insert_batch(&self, batch: Vec<EventOccurrence>) -> CadenceResult<()> {
        let mut rows = self.lock()?;
        // Reject the whole batch before touching the map
        for row in &batch {
            if rows.contains_key(&row.id) {
                return Err(CadenceError::Storage(format!(
                    "duplicate occurrence id: {}",
                    row.id
                )));
            }
        }
        for row in batch {
            rows.insert(row.id.clone(), row);
        }
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> CadenceResult<Option<EventOccurrence>> {
        let rows = self.lock()?;
        Ok(rows
            .get(id)
            .filter(|row| row.deleted_at.is_none())
            .cloned())
    }

    fn find_by_series(&self, series_id: &str) -> CadenceResult<Vec<EventOccurrence>> {
        let rows = self.lock()?;
        let mut members: Vec<EventOccurrence> = rows
            .values()
            .filter(|row| row.deleted_at.is_none() && row.series_id.as_deref() == Some(series_id))
            .cloned()
            .collect();
        members.sort_by_key(|row| row.start_time);
        Ok(members)
    }

    fn update(&self, id: &str, fields: &OccurrenceUpdate) -> CadenceResult<Option<EventOccurrence>> {
        let mut rows = self.lock()?;
        match rows.get_mut(id).filter(|row| row.deleted_at.is_none()) {
            Some(row) => {
                fields.apply(row);
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    fn soft_delete(&self, id: &str) -> CadenceResult<bool> {
        let mut rows = self.lock()?;
        match rows.get_mut(id).filter(|row| row.deleted_at.is_none()) {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
