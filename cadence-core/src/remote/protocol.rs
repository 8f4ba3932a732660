//! Defines the JSON protocol used for communication between the engine
//! and provider binaries over stdin/stdout.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::EventOccurrence;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

/// Commands that providers must implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    AddAttendee,
    RemoveAttendee,
}

/// Request sent from the engine to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider to the engine.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap()
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap()
    }
}

/// Event body pushed to the remote calendar. For a series this carries the
/// recurrence rule of the single remote recurring event; local occurrence
/// rows are not mirrored individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEventPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
}

impl RemoteEventPayload {
    pub fn from_occurrence(occurrence: &EventOccurrence, recurrence_rule: Option<String>) -> Self {
        RemoteEventPayload {
            title: occurrence.title.clone(),
            description: occurrence.description.clone(),
            location: occurrence.location.clone(),
            start: occurrence.start_time,
            end: occurrence.end_time,
            recurrence_rule,
        }
    }
}

/// Partial remote patch. `None` fields are left untouched remotely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteEventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDateTime>,
}

/// Create a new remote event (single or recurring).
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    /// Provider-specific config (e.g., account, calendar id)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event: RemoteEventPayload,
}

impl ProviderCommand for CreateEvent {
    type Response = String; // Remote event id
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Patch an existing remote event.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub remote_id: String,
    pub patch: RemoteEventPatch,
}

impl ProviderCommand for UpdateEvent {
    type Response = ();
    fn command() -> Command {
        Command::UpdateEvent
    }
}

/// Delete a remote event by id.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub remote_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}

/// Add an attendee to a remote event.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddAttendee {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub remote_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProviderCommand for AddAttendee {
    type Response = ();
    fn command() -> Command {
        Command::AddAttendee
    }
}

/// Remove an attendee from a remote event.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveAttendee {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub remote_id: String,
    pub email: String,
}

impl ProviderCommand for RemoveAttendee {
    type Response = ();
    fn command() -> Command {
        Command::RemoveAttendee
    }
}
