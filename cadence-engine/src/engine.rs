//! Caller-facing operation surface.
//!
//! `EventEngine` wires the coordinator, the sync adapter, and the
//! registration ledger into the operations the API layer invokes. Local
//! persistence always completes (or fails) before any remote dispatch;
//! the remote calendar is a best-effort mirror and never affects results.

use std::sync::Arc;

use chrono::NaiveDateTime;

use cadence_core::error::{CadenceError, CadenceResult};
use cadence_core::event::{EventOccurrence, OccurrenceTemplate, OccurrenceUpdate, Visibility};
use cadence_core::generator::{GeneratorLimits, OccurrenceGenerator};
use cadence_core::recurrence::RecurrenceSpec;
use cadence_core::remote::{CalendarRemote, RemoteEventPatch};

use crate::config::EngineConfig;
use crate::registration::{Registrant, RegistrationLedger, RegistrationRecord};
use crate::series::SeriesCoordinator;
use crate::store::OccurrenceStore;
use crate::sync::CalendarSync;

pub struct EventEngine<S: OccurrenceStore> {
    store: Arc<S>,
    coordinator: SeriesCoordinator<S>,
    sync: CalendarSync<S>,
    ledger: RegistrationLedger,
}

impl<S: OccurrenceStore> EventEngine<S> {
    pub fn new(
        store: Arc<S>,
        remote: Option<Arc<dyn CalendarRemote>>,
        limits: GeneratorLimits,
    ) -> Self {
        EventEngine {
            coordinator: SeriesCoordinator::new(store.clone(), OccurrenceGenerator::new(limits)),
            sync: CalendarSync::new(store.clone(), remote),
            ledger: RegistrationLedger::new(),
            store,
        }
    }

    /// Build an engine from configuration: the provider named there backs
    /// the sync adapter, and the expansion bounds come from the same file.
    pub fn with_config(store: Arc<S>, config: &EngineConfig) -> Self {
        let remote = config
            .remote()
            .map(|r| Arc::new(r) as Arc<dyn CalendarRemote>);
        EventEngine::new(store, remote, config.limits())
    }

    /// Read-side access to RSVP state.
    pub fn ledger(&self) -> &RegistrationLedger {
        &self.ledger
    }

    /// Wait out in-flight sync dispatches (shutdown hook; local operations
    /// never depend on it).
    pub async fn flush_sync(&self) {
        self.sync.flush().await;
    }

    pub async fn create_single_event(
        &self,
        template: &OccurrenceTemplate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> CadenceResult<EventOccurrence> {
        let row = self.coordinator.create_single(template, start, end)?;
        self.sync.dispatch_create(vec![row.clone()], None);
        Ok(row)
    }

    /// Create a recurring series; returns the first occurrence as the
    /// created resource.
    pub async fn create_recurring_series(
        &self,
        template: &OccurrenceTemplate,
        start: NaiveDateTime,
        end: NaiveDateTime,
        spec: &RecurrenceSpec,
    ) -> CadenceResult<EventOccurrence> {
        let first = self.coordinator.create_series(template, start, end, spec)?;
        if let Some(series_id) = &first.series_id {
            let rows = self.store.find_by_series(series_id)?;
            self.sync.dispatch_create(rows, Some(spec.to_remote_rule()));
        }
        Ok(first)
    }

    /// Convert a standalone occurrence into the first member of a series.
    pub async fn convert_existing_to_series(
        &self,
        id: &str,
        overrides: &OccurrenceUpdate,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
        spec: &RecurrenceSpec,
    ) -> CadenceResult<EventOccurrence> {
        // Snapshot before conversion: if the standalone row was already
        // mirrored remotely, that single event is superseded by the new
        // recurring one and gets a best-effort cleanup delete.
        let prior = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))?;

        let first = self
            .coordinator
            .convert_to_series(id, overrides, new_start, new_end, spec)?;

        if prior.series_id.is_none() && prior.external_calendar_id.is_some() {
            self.sync.dispatch_delete(&prior);
        }
        if let Some(series_id) = &first.series_id {
            let rows = self.store.find_by_series(series_id)?;
            self.sync.dispatch_create(rows, Some(spec.to_remote_rule()));
        }
        Ok(first)
    }

    /// Per-row update; siblings of a series are never touched.
    pub async fn update_occurrence(
        &self,
        id: &str,
        fields: &OccurrenceUpdate,
    ) -> CadenceResult<EventOccurrence> {
        let row = self.coordinator.update_occurrence(id, fields)?;
        if let Some(remote_id) = &row.external_calendar_id {
            self.sync
                .dispatch_update(remote_id.clone(), remote_patch(fields));
        }
        Ok(row)
    }

    /// Soft-delete one occurrence. The shared remote recurring event of a
    /// series survives member deletes; only a standalone row with a remote
    /// id triggers a remote delete.
    pub async fn delete_occurrence(&self, id: &str) -> CadenceResult<bool> {
        let row = self.coordinator.delete_occurrence(id)?;
        self.sync.dispatch_delete(&row);
        Ok(true)
    }

    /// Register a user for one occurrence. Member-only occurrences mirror
    /// the registrant onto the remote event's attendee list, best-effort.
    pub async fn rsvp(
        &self,
        occurrence_id: &str,
        registrant: &Registrant,
    ) -> CadenceResult<RegistrationRecord> {
        let row = self
            .store
            .find_by_id(occurrence_id)?
            .ok_or_else(|| CadenceError::NotFound(occurrence_id.to_string()))?;

        let record = self.ledger.add(occurrence_id, registrant)?;

        if row.visibility == Visibility::MemberOnly {
            if let Some(remote_id) = &row.external_calendar_id {
                self.sync.dispatch_add_attendee(
                    remote_id.clone(),
                    registrant.email.clone(),
                    registrant.name.clone(),
                );
            }
        }
        Ok(record)
    }

    /// Cancel a registration; returns whether one existed.
    pub async fn cancel_rsvp(&self, occurrence_id: &str, user_id: &str) -> CadenceResult<bool> {
        let row = self
            .store
            .find_by_id(occurrence_id)?
            .ok_or_else(|| CadenceError::NotFound(occurrence_id.to_string()))?;

        let Some(removed) = self.ledger.cancel(occurrence_id, user_id)? else {
            return Ok(false);
        };

        if row.visibility == Visibility::MemberOnly {
            if let Some(remote_id) = &row.external_calendar_id {
                self.sync
                    .dispatch_remove_attendee(remote_id.clone(), removed.email.clone());
            }
        }
        Ok(true)
    }
}

/// Project the remotely relevant slice of a row update.
fn remote_patch(fields: &OccurrenceUpdate) -> RemoteEventPatch {
    RemoteEventPatch {
        title: fields.title.clone(),
        description: fields.description.clone(),
        location: fields.location.clone(),
        start: fields.start_time,
        end: fields.end_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::RecordingRemote;
    use cadence_core::event::EventType;
    use cadence_core::recurrence::Frequency;
    use chrono::{NaiveDate, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn make_template(visibility: Visibility) -> OccurrenceTemplate {
        OccurrenceTemplate {
            title: "Book Club".to_string(),
            description: None,
            location: Some("Library".to_string()),
            visibility,
            event_type: EventType::Internal,
            external_registration_url: None,
            image_url: None,
            created_by: "user-1".to_string(),
        }
    }

    fn make_engine() -> (Arc<MemoryStore>, Arc<RecordingRemote>, EventEngine<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(RecordingRemote::new());
        let engine = EventEngine::new(
            store.clone(),
            Some(remote.clone() as Arc<dyn CalendarRemote>),
            GeneratorLimits::default(),
        );
        (store, remote, engine)
    }

    fn weekly_mondays(end: NaiveDateTime) -> RecurrenceSpec {
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.days_of_week = vec![Weekday::Mon];
        spec.recurring_end_date = Some(end);
        spec
    }

    fn alice() -> Registrant {
        Registrant {
            user_id: "u-alice".to_string(),
            email: "alice@example.com".to_string(),
            name: Some("Alice".to_string()),
        }
    }

    #[tokio::test]
    async fn test_series_creation_yields_one_remote_id_across_rows() {
        let (store, remote, engine) = make_engine();
        let spec = weekly_mondays(at(2026, 3, 16, 0));

        let first = engine
            .create_recurring_series(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
                &spec,
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        assert_eq!(remote.calls().len(), 1);
        let members = store
            .find_by_series(first.series_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(members.len(), 3);
        for member in members {
            assert_eq!(member.external_calendar_id.as_deref(), Some("remote-1"));
        }
    }

    #[tokio::test]
    async fn test_local_creation_survives_remote_failure() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(RecordingRemote::failing());
        let engine = EventEngine::new(
            store.clone(),
            Some(remote.clone() as Arc<dyn CalendarRemote>),
            GeneratorLimits::default(),
        );

        let row = engine
            .create_single_event(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        let found = store.find_by_id(&row.id).unwrap().unwrap();
        assert!(found.external_calendar_id.is_none());
    }

    #[tokio::test]
    async fn test_zero_occurrence_spec_creates_nothing_and_syncs_nothing() {
        let (_, remote, engine) = make_engine();
        let spec = weekly_mondays(at(2026, 1, 1, 0)); // before start

        let result = engine
            .create_recurring_series(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
                &spec,
            )
            .await;
        engine.flush_sync().await;

        assert!(matches!(result, Err(CadenceError::Validation(_))));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_series_member_delete_keeps_remote_event() {
        let (_, remote, engine) = make_engine();
        let spec = weekly_mondays(at(2026, 3, 16, 0));
        let first = engine
            .create_recurring_series(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
                &spec,
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        assert!(engine.delete_occurrence(&first.id).await.unwrap());
        engine.flush_sync().await;

        let deletes: Vec<String> = remote
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("delete:"))
            .collect();
        assert!(deletes.is_empty());
    }

    #[tokio::test]
    async fn test_standalone_delete_hits_remote_once() {
        let (_, remote, engine) = make_engine();
        let row = engine
            .create_single_event(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await; // remote id writeback

        assert!(engine.delete_occurrence(&row.id).await.unwrap());
        engine.flush_sync().await;

        let deletes: Vec<String> = remote
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("delete:"))
            .collect();
        assert_eq!(deletes, vec!["delete:remote-1"]);
    }

    #[tokio::test]
    async fn test_convert_cleans_up_superseded_remote_event() {
        let (store, remote, engine) = make_engine();
        let row = engine
            .create_single_event(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await; // standalone now carries remote-1

        let spec = weekly_mondays(at(2026, 3, 16, 0));
        let first = engine
            .convert_existing_to_series(
                &row.id,
                &OccurrenceUpdate::default(),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
                &spec,
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        assert_eq!(first.id, row.id);
        assert!(remote.calls().contains(&"delete:remote-1".to_string()));
        // Every member of the new series shares the freshly created id
        for member in store
            .find_by_series(first.series_id.as_deref().unwrap())
            .unwrap()
        {
            assert_eq!(member.external_calendar_id.as_deref(), Some("remote-1"));
        }
    }

    #[tokio::test]
    async fn test_update_patches_remote_for_synced_row() {
        let (_, remote, engine) = make_engine();
        let row = engine
            .create_single_event(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        let fields = OccurrenceUpdate {
            title: Some("Book Club (moved)".to_string()),
            ..Default::default()
        };
        engine.update_occurrence(&row.id, &fields).await.unwrap();
        engine.flush_sync().await;

        assert!(remote.calls().contains(&"update:remote-1".to_string()));
    }

    #[tokio::test]
    async fn test_rsvp_mirrors_attendee_for_member_only_events() {
        let (_, remote, engine) = make_engine();
        let row = engine
            .create_single_event(
                &make_template(Visibility::MemberOnly),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        engine.rsvp(&row.id, &alice()).await.unwrap();
        engine.flush_sync().await;

        assert!(
            remote
                .calls()
                .contains(&"add_attendee:remote-1:alice@example.com".to_string())
        );
        assert_eq!(engine.ledger().count(&row.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rsvp_skips_attendee_sync_for_public_events() {
        let (_, remote, engine) = make_engine();
        let row = engine
            .create_single_event(
                &make_template(Visibility::Public),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        engine.rsvp(&row.id, &alice()).await.unwrap();
        engine.flush_sync().await;

        assert!(!remote.calls().iter().any(|c| c.starts_with("add_attendee")));
        assert_eq!(engine.ledger().count(&row.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancel_rsvp_removes_attendee_and_reports_existence() {
        let (_, remote, engine) = make_engine();
        let row = engine
            .create_single_event(
                &make_template(Visibility::MemberOnly),
                at(2026, 3, 2, 18),
                at(2026, 3, 2, 20),
            )
            .await
            .unwrap();
        engine.flush_sync().await;

        engine.rsvp(&row.id, &alice()).await.unwrap();
        assert!(engine.cancel_rsvp(&row.id, "u-alice").await.unwrap());
        assert!(!engine.cancel_rsvp(&row.id, "u-alice").await.unwrap());
        engine.flush_sync().await;

        assert!(
            remote
                .calls()
                .contains(&"remove_attendee:remote-1:alice@example.com".to_string())
        );
        assert_eq!(engine.ledger().count(&row.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rsvp_on_unknown_occurrence_is_not_found() {
        let (_, _, engine) = make_engine();
        assert!(matches!(
            engine.rsvp("missing", &alice()).await,
            Err(CadenceError::NotFound(_))
        ));
    }
}
