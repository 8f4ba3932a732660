//! Series orchestration.
//!
//! `SeriesCoordinator` owns the identity invariants of recurring series:
//! one fresh series id per creation, the same template fields stamped onto
//! every generated row, and id preservation when a standalone occurrence
//! becomes the first member of a series.

use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use cadence_core::error::{CadenceError, CadenceResult};
use cadence_core::event::{EventOccurrence, OccurrenceTemplate, OccurrenceUpdate};
use cadence_core::generator::OccurrenceGenerator;
use cadence_core::recurrence::RecurrenceSpec;

use crate::store::OccurrenceStore;

pub struct SeriesCoordinator<S: OccurrenceStore> {
    store: Arc<S>,
    generator: OccurrenceGenerator,
}

impl<S: OccurrenceStore> SeriesCoordinator<S> {
    pub fn new(store: Arc<S>, generator: OccurrenceGenerator) -> Self {
        SeriesCoordinator { store, generator }
    }

    /// Create one standalone occurrence row.
    pub fn create_single(
        &self,
        template: &OccurrenceTemplate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> CadenceResult<EventOccurrence> {
        validate_interval(start, end)?;
        self.store
            .insert(EventOccurrence::from_template(template, start, end, None))
    }

    /// Expand a recurrence spec into rows and persist them as one batch.
    ///
    /// Returns the first generated occurrence as the representative of the
    /// series; this is part of the contract, not an incidental choice.
    pub fn create_series(
        &self,
        template: &OccurrenceTemplate,
        start: NaiveDateTime,
        end: NaiveDateTime,
        spec: &RecurrenceSpec,
    ) -> CadenceResult<EventOccurrence> {
        validate_interval(start, end)?;

        let windows = self.generator.generate(start, end, spec);
        if windows.is_empty() {
            return Err(CadenceError::Validation(
                "no occurrences could be generated for the given recurrence".to_string(),
            ));
        }

        let series_id = Uuid::new_v4().to_string();
        let rows: Vec<EventOccurrence> = windows
            .iter()
            .map(|w| {
                EventOccurrence::from_template(template, w.start, w.end, Some(series_id.clone()))
            })
            .collect();

        // Clone before the batch move so the representative can be returned
        // without a second read.
        let first = rows[0].clone();
        self.store.insert_batch(rows)?;
        Ok(first)
    }

    /// Turn a standalone occurrence into the first member of a new series.
    ///
    /// The existing row keeps its id (and with it any references such as
    /// registrations) and receives the first generated window in place; the
    /// remaining windows become fresh rows under the same series id.
    pub fn convert_to_series(
        &self,
        id: &str,
        overrides: &OccurrenceUpdate,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
        spec: &RecurrenceSpec,
    ) -> CadenceResult<EventOccurrence> {
        validate_interval(new_start, new_end)?;

        let existing = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))?;
        if existing.series_id.is_some() {
            return Err(CadenceError::Conflict(format!(
                "occurrence {} already belongs to a series",
                id
            )));
        }

        let template = OccurrenceTemplate::from_occurrence(&existing, overrides);
        let windows = self.generator.generate(new_start, new_end, spec);
        if windows.is_empty() {
            return Err(CadenceError::Validation(
                "no occurrences could be generated for the given recurrence".to_string(),
            ));
        }

        let series_id = Uuid::new_v4().to_string();

        let first_window = windows[0];
        let promote = OccurrenceUpdate {
            series_id: Some(series_id.clone()),
            title: Some(template.title.clone()),
            description: template.description.clone(),
            location: template.location.clone(),
            visibility: Some(template.visibility),
            event_type: Some(template.event_type),
            external_registration_url: template.external_registration_url.clone(),
            image_url: template.image_url.clone(),
            start_time: Some(first_window.start),
            end_time: Some(first_window.end),
            external_calendar_id: None,
        };
        let first = self
            .store
            .update(id, &promote)?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))?;

        let siblings: Vec<EventOccurrence> = windows[1..]
            .iter()
            .map(|w| {
                EventOccurrence::from_template(&template, w.start, w.end, Some(series_id.clone()))
            })
            .collect();
        if !siblings.is_empty() {
            self.store.insert_batch(siblings)?;
        }

        Ok(first)
    }

    /// Per-row field update. Never cascades to sibling rows of a series.
    pub fn update_occurrence(
        &self,
        id: &str,
        fields: &OccurrenceUpdate,
    ) -> CadenceResult<EventOccurrence> {
        if let (Some(start), Some(end)) = (fields.start_time, fields.end_time) {
            validate_interval(start, end)?;
        }
        self.store
            .update(id, fields)?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))
    }

    /// Soft-delete exactly one row; siblings are untouched. Returns the
    /// pre-delete row so callers can route remote sync from it.
    pub fn delete_occurrence(&self, id: &str) -> CadenceResult<EventOccurrence> {
        let existing = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))?;
        self.store.soft_delete(id)?;
        Ok(existing)
    }
}

fn validate_interval(start: NaiveDateTime, end: NaiveDateTime) -> CadenceResult<()> {
    if end <= start {
        return Err(CadenceError::Validation(
            "end time must be after start time".to_string(),
        ));
    }
    Ok(())
}
