//! Shared test doubles.

use std::sync::Mutex;

use async_trait::async_trait;

use cadence_core::error::{CadenceError, CadenceResult};
use cadence_core::remote::{CalendarRemote, RemoteEventPatch, RemoteEventPayload};

/// A remote calendar that records every call it receives. Construct with
/// `failing()` to make every operation error after being recorded.
#[derive(Default)]
pub(crate) struct RecordingRemote {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingRemote {
    pub fn new() -> Self {
        RecordingRemote::default()
    }

    pub fn failing() -> Self {
        RecordingRemote {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, entry: String) -> CadenceResult<()> {
        self.calls.lock().unwrap().push(entry);
        if self.fail {
            Err(CadenceError::Provider("remote unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CalendarRemote for RecordingRemote {
    async fn create_event(&self, event: RemoteEventPayload) -> CadenceResult<String> {
        self.record(format!(
            "create:{}",
            event.recurrence_rule.as_deref().unwrap_or("single")
        ))?;
        Ok("remote-1".to_string())
    }

    async fn update_event(&self, remote_id: &str, _patch: RemoteEventPatch) -> CadenceResult<()> {
        self.record(format!("update:{remote_id}"))
    }

    async fn delete_event(&self, remote_id: &str) -> CadenceResult<()> {
        self.record(format!("delete:{remote_id}"))
    }

    async fn add_attendee(
        &self,
        remote_id: &str,
        email: &str,
        _name: Option<&str>,
    ) -> CadenceResult<()> {
        self.record(format!("add_attendee:{remote_id}:{email}"))
    }

    async fn remove_attendee(&self, remote_id: &str, email: &str) -> CadenceResult<()> {
        self.record(format!("remove_attendee:{remote_id}:{email}"))
    }
}
