//! Occurrence row types.
//!
//! An `EventOccurrence` is one calendar-displayable instance. Rows belonging
//! to the same series share a `series_id` and the template fields captured
//! when the series was created; start/end and later per-row edits are
//! independent per occurrence.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who can see (and register for) an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    MemberOnly,
}

/// Whether registration happens here or on an external page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Internal,
    External,
}

/// One concrete event instance with a fixed start/end time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub id: String,
    /// Set iff this row belongs to a recurring series. All members of one
    /// series carry the same value.
    pub series_id: Option<String>,

    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub visibility: Visibility,
    pub event_type: EventType,
    pub external_registration_url: Option<String>,
    pub image_url: Option<String>,
    pub created_by: String,

    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,

    /// Remote calendar event id. For a series this is the id of the single
    /// remote recurring event, identical across all member rows once sync
    /// succeeds.
    pub external_calendar_id: Option<String>,

    /// Last local modification timestamp.
    pub updated: Option<DateTime<Utc>>,
    /// Soft-delete marker. Rows are never hard-deleted by this subsystem.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EventOccurrence {
    /// Build a row from shared template fields and one generated window.
    pub fn from_template(
        template: &OccurrenceTemplate,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        series_id: Option<String>,
    ) -> Self {
        EventOccurrence {
            id: Uuid::new_v4().to_string(),
            series_id,
            title: template.title.clone(),
            description: template.description.clone(),
            location: template.location.clone(),
            visibility: template.visibility,
            event_type: template.event_type,
            external_registration_url: template.external_registration_url.clone(),
            image_url: template.image_url.clone(),
            created_by: template.created_by.clone(),
            start_time,
            end_time,
            external_calendar_id: None,
            updated: None,
            deleted_at: None,
        }
    }

    pub fn is_series_member(&self) -> bool {
        self.series_id.is_some()
    }
}

/// Shared fields captured once at series creation/conversion time and
/// stamped onto every generated row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceTemplate {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub visibility: Visibility,
    pub event_type: EventType,
    pub external_registration_url: Option<String>,
    pub image_url: Option<String>,
    pub created_by: String,
}

impl OccurrenceTemplate {
    /// Recapture the template fields of an existing row, with overrides
    /// from a partial update applied on top.
    pub fn from_occurrence(occurrence: &EventOccurrence, overrides: &OccurrenceUpdate) -> Self {
        OccurrenceTemplate {
            title: overrides.title.clone().unwrap_or_else(|| occurrence.title.clone()),
            description: overrides
                .description
                .clone()
                .or_else(|| occurrence.description.clone()),
            location: overrides
                .location
                .clone()
                .or_else(|| occurrence.location.clone()),
            visibility: overrides.visibility.unwrap_or(occurrence.visibility),
            event_type: overrides.event_type.unwrap_or(occurrence.event_type),
            external_registration_url: overrides
                .external_registration_url
                .clone()
                .or_else(|| occurrence.external_registration_url.clone()),
            image_url: overrides
                .image_url
                .clone()
                .or_else(|| occurrence.image_url.clone()),
            created_by: occurrence.created_by.clone(),
        }
    }
}

/// Partial per-row update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccurrenceUpdate {
    /// Set only when a standalone row is promoted into the first member
    /// of a series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_registration_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_calendar_id: Option<String>,
}

impl OccurrenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.series_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.visibility.is_none()
            && self.event_type.is_none()
            && self.external_registration_url.is_none()
            && self.image_url.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.external_calendar_id.is_none()
    }

    /// Apply this update to a row in place, stamping `updated`.
    pub fn apply(&self, occurrence: &mut EventOccurrence) {
        if let Some(series_id) = &self.series_id {
            occurrence.series_id = Some(series_id.clone());
        }
        if let Some(title) = &self.title {
            occurrence.title = title.clone();
        }
        if let Some(description) = &self.description {
            occurrence.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            occurrence.location = Some(location.clone());
        }
        if let Some(visibility) = self.visibility {
            occurrence.visibility = visibility;
        }
        if let Some(event_type) = self.event_type {
            occurrence.event_type = event_type;
        }
        if let Some(url) = &self.external_registration_url {
            occurrence.external_registration_url = Some(url.clone());
        }
        if let Some(url) = &self.image_url {
            occurrence.image_url = Some(url.clone());
        }
        if let Some(start_time) = self.start_time {
            occurrence.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            occurrence.end_time = end_time;
        }
        if let Some(remote_id) = &self.external_calendar_id {
            occurrence.external_calendar_id = Some(remote_id.clone());
        }
        occurrence.updated = Some(Utc::now());
    }
}
