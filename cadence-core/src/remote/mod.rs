//! Remote calendar operations via providers.

pub mod protocol;
pub mod provider;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CadenceResult;
pub use crate::remote::protocol::{
    AddAttendee, CreateEvent, DeleteEvent, RemoteEventPatch, RemoteEventPayload, RemoveAttendee,
    UpdateEvent,
};
pub use crate::remote::provider::Provider;

/// The remote calendar operations this engine consumes. Implementations
/// are opaque collaborators: any call may fail independently of local
/// state, and callers decide what failure means.
#[async_trait]
pub trait CalendarRemote: Send + Sync {
    /// Create a remote event (recurring when the payload carries a rule);
    /// returns the remote event id.
    async fn create_event(&self, event: RemoteEventPayload) -> CadenceResult<String>;

    /// Patch an existing remote event.
    async fn update_event(&self, remote_id: &str, patch: RemoteEventPatch) -> CadenceResult<()>;

    /// Delete a remote event.
    async fn delete_event(&self, remote_id: &str) -> CadenceResult<()>;

    /// Add an attendee to a remote event.
    async fn add_attendee(
        &self,
        remote_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> CadenceResult<()>;

    /// Remove an attendee from a remote event.
    async fn remove_attendee(&self, remote_id: &str, email: &str) -> CadenceResult<()>;
}

/// Provider-specific configuration values passed through verbatim
/// (e.g., account identifier, calendar id).
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// A provider-backed remote calendar.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }
}

#[async_trait]
impl CalendarRemote for Remote {
    async fn create_event(&self, event: RemoteEventPayload) -> CadenceResult<String> {
        self.provider
            .call(CreateEvent {
                remote_config: self.remote_config(),
                event,
            })
            .await
    }

    async fn update_event(&self, remote_id: &str, patch: RemoteEventPatch) -> CadenceResult<()> {
        self.provider
            .call(UpdateEvent {
                remote_config: self.remote_config(),
                remote_id: remote_id.to_string(),
                patch,
            })
            .await
    }

    async fn delete_event(&self, remote_id: &str) -> CadenceResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.remote_config(),
                remote_id: remote_id.to_string(),
            })
            .await
    }

    async fn add_attendee(
        &self,
        remote_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> CadenceResult<()> {
        self.provider
            .call(AddAttendee {
                remote_config: self.remote_config(),
                remote_id: remote_id.to_string(),
                email: email.to_string(),
                name: name.map(str::to_string),
            })
            .await
    }

    async fn remove_attendee(&self, remote_id: &str, email: &str) -> CadenceResult<()> {
        self.provider
            .call(RemoveAttendee {
                remote_config: self.remote_config(),
                remote_id: remote_id.to_string(),
                email: email.to_string(),
            })
            .await
    }
}
