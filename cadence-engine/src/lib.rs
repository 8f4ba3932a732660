//! Recurring-event occurrence engine.
//!
//! Expands recurrence descriptions into concrete occurrence rows, keeps
//! series identity consistent across create/convert/update/delete, and
//! mirrors each series to a single remote calendar event, best-effort.
//!
//! The API layer talks to [`EventEngine`]; everything underneath is
//! reachable for callers that need finer control:
//! - [`series::SeriesCoordinator`] — row creation and series identity
//! - [`sync::CalendarSync`] — fire-and-forget remote calendar dispatch
//! - [`registration::RegistrationLedger`] — per-occurrence RSVP state
//! - [`store::OccurrenceStore`] — the persistence contract

pub mod config;
pub mod engine;
pub mod registration;
pub mod series;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::EngineConfig;
pub use engine::EventEngine;
pub use registration::{Registrant, RegistrationLedger, RegistrationRecord, RegistrationStatus};
pub use series::SeriesCoordinator;
pub use store::{MemoryStore, OccurrenceStore};
pub use sync::CalendarSync;

// The domain types callers pass in and get back
pub use cadence_core::error::{CadenceError, CadenceResult};
pub use cadence_core::event::{
    EventOccurrence, EventType, OccurrenceTemplate, OccurrenceUpdate, Visibility,
};
pub use cadence_core::generator::{GeneratorLimits, OccurrenceGenerator, OccurrenceWindow};
pub use cadence_core::recurrence::{Frequency, MonthlyPattern, RecurrenceSpec};
