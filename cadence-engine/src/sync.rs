//! Best-effort calendar sync.
//!
//! Bridges local occurrence rows to one external calendar entity per
//! series (or per standalone event). Every dispatch is detached from the
//! local operation that triggered it: remote failures are logged and
//! swallowed, and local state is authoritative.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use cadence_core::event::{EventOccurrence, OccurrenceUpdate};
use cadence_core::remote::{CalendarRemote, RemoteEventPatch, RemoteEventPayload};

use crate::store::OccurrenceStore;

pub struct CalendarSync<S: OccurrenceStore> {
    store: Arc<S>,
    remote: Option<Arc<dyn CalendarRemote>>,
    /// In-flight dispatch tasks, held so `flush` can wait them out.
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: OccurrenceStore> CalendarSync<S> {
    pub fn new(store: Arc<S>, remote: Option<Arc<dyn CalendarRemote>>) -> Self {
        CalendarSync {
            store,
            remote,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Create the remote event for a batch of rows (one series, or one
    /// standalone row) and write the returned id back onto every row.
    pub fn dispatch_create(&self, rows: Vec<EventOccurrence>, recurrence_rule: Option<String>) {
        let Some(remote) = self.remote.clone() else {
            debug!("calendar sync disabled; skipping remote create");
            return;
        };
        let Some(first) = rows.first() else {
            return;
        };
        let payload = RemoteEventPayload::from_occurrence(first, recurrence_rule);
        let store = self.store.clone();

        self.track(tokio::spawn(async move {
            match remote.create_event(payload).await {
                Ok(remote_id) => {
                    // Rows are independent records, so the shared remote id
                    // is written per row rather than in one shot.
                    for row in &rows {
                        let fields = OccurrenceUpdate {
                            external_calendar_id: Some(remote_id.clone()),
                            ..Default::default()
                        };
                        match store.update(&row.id, &fields) {
                            Ok(Some(_)) => {}
                            Ok(None) => {
                                debug!(occurrence = %row.id, "row vanished before remote id writeback")
                            }
                            Err(e) => {
                                warn!(occurrence = %row.id, error = %e, "failed to record remote calendar id")
                            }
                        }
                    }
                }
                Err(e) => warn!(error = %e, "remote calendar create failed; local rows keep no remote id"),
            }
        }));
    }

    /// Patch the remote event backing a row.
    pub fn dispatch_update(&self, remote_id: String, patch: RemoteEventPatch) {
        let Some(remote) = self.remote.clone() else {
            debug!("calendar sync disabled; skipping remote update");
            return;
        };
        self.track(tokio::spawn(async move {
            if let Err(e) = remote.update_event(&remote_id, patch).await {
                warn!(remote_id = %remote_id, error = %e, "remote calendar update failed");
            }
        }));
    }

    /// Delete the remote event backing a standalone row.
    ///
    /// Series members share one remote recurring event, so deleting a
    /// single member must never delete it; those dispatches are suppressed.
    pub fn dispatch_delete(&self, occurrence: &EventOccurrence) {
        if occurrence.is_series_member() {
            debug!(
                occurrence = %occurrence.id,
                "series member deleted locally; shared remote recurring event kept"
            );
            return;
        }
        let Some(remote_id) = occurrence.external_calendar_id.clone() else {
            return;
        };
        let Some(remote) = self.remote.clone() else {
            debug!("calendar sync disabled; skipping remote delete");
            return;
        };
        self.track(tokio::spawn(async move {
            if let Err(e) = remote.delete_event(&remote_id).await {
                warn!(remote_id = %remote_id, error = %e, "remote calendar delete failed");
            }
        }));
    }

    pub fn dispatch_add_attendee(&self, remote_id: String, email: String, name: Option<String>) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        self.track(tokio::spawn(async move {
            if let Err(e) = remote
                .add_attendee(&remote_id, &email, name.as_deref())
                .await
            {
                warn!(remote_id = %remote_id, error = %e, "remote attendee add failed");
            }
        }));
    }

    pub fn dispatch_remove_attendee(&self, remote_id: String, email: String) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        self.track(tokio::spawn(async move {
            if let Err(e) = remote.remove_attendee(&remote_id, &email).await {
                warn!(remote_id = %remote_id, error = %e, "remote attendee remove failed");
            }
        }));
    }

    /// Wait out all in-flight dispatches. Local operations never need
    /// this; it exists for graceful shutdown and for tests.
    pub async fn flush(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(handle);
        }
    }
}
