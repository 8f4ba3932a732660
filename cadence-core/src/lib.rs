//! Core types for the cadence occurrence engine.
//!
//! This crate provides the pieces shared by the engine and calendar
//! providers:
//! - `EventOccurrence` and related row types
//! - `RecurrenceSpec` and the pure occurrence generator
//! - the `remote` module for the engine-provider communication protocol

pub mod error;
pub mod event;
pub mod generator;
pub mod recurrence;
pub mod remote;

// Re-export the domain types at crate root for convenience
pub use error::{CadenceError, CadenceResult};
pub use event::{EventOccurrence, EventType, OccurrenceTemplate, OccurrenceUpdate, Visibility};
pub use generator::{GeneratorLimits, OccurrenceGenerator, OccurrenceWindow};
pub use recurrence::{Frequency, MonthlyPattern, RecurrenceSpec};
