//! Per-occurrence RSVP state.
//!
//! Independent of recurrence logic: registrations attach to individual
//! occurrence rows, never to a series.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_core::error::{CadenceError, CadenceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
}

/// Who is registering. The email/name feed attendee sync for member-only
/// events; user lookup itself lives outside this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registrant {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One RSVP, unique per (occurrence, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub occurrence_id: String,
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: RegistrationStatus,
    pub guest_count: u32,
    pub registered_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct RegistrationLedger {
    records: Mutex<HashMap<(String, String), RegistrationRecord>>,
}

impl RegistrationLedger {
    pub fn new() -> Self {
        RegistrationLedger::default()
    }

    fn lock(
        &self,
    ) -> CadenceResult<std::sync::MutexGuard<'_, HashMap<(String, String), RegistrationRecord>>>
    {
        self.records
            .lock()
            .map_err(|_| CadenceError::Storage("registration ledger lock poisoned".to_string()))
    }

    /// Idempotent upsert: registering twice keeps the original record.
    pub fn add(
        &self,
        occurrence_id: &str,
        registrant: &Registrant,
    ) -> CadenceResult<RegistrationRecord> {
        let mut records = self.lock()?;
        let key = (occurrence_id.to_string(), registrant.user_id.clone());
        let record = records.entry(key).or_insert_with(|| RegistrationRecord {
            occurrence_id: occurrence_id.to_string(),
            user_id: registrant.user_id.clone(),
            email: registrant.email.clone(),
            name: registrant.name.clone(),
            status: RegistrationStatus::Registered,
            guest_count: 0,
            registered_at: Utc::now(),
        });
        record.status = RegistrationStatus::Registered;
        Ok(record.clone())
    }

    /// Remove a registration; returns the removed record when one existed.
    pub fn cancel(
        &self,
        occurrence_id: &str,
        user_id: &str,
    ) -> CadenceResult<Option<RegistrationRecord>> {
        let mut records = self.lock()?;
        Ok(records.remove(&(occurrence_id.to_string(), user_id.to_string())))
    }

    pub fn status(
        &self,
        occurrence_id: &str,
        user_id: &str,
    ) -> CadenceResult<Option<RegistrationStatus>> {
        let records = self.lock()?;
        Ok(records
            .get(&(occurrence_id.to_string(), user_id.to_string()))
            .map(|record| record.status))
    }

    /// Number of registered users for one occurrence. Guest counts are
    /// carried on the records but do not inflate this number.
    pub fn count(&self, occurrence_id: &str) -> CadenceResult<usize> {
        let records = self.lock()?;
        Ok(records
            .values()
            .filter(|record| record.occurrence_id == occurrence_id)
            .count())
    }
}
