//! Telemetry and structured logging for railfare.
//!
//! Handles console and JSON file output with daily rotation, and typed fare
//! events emitted while a query runs.

pub mod event_logger;
pub mod logger;

pub use event_logger::{FARE_EVENTS_TARGET, FareEvent, FareEventLogger, FareLogEntry};
pub use logger::init_logger;
