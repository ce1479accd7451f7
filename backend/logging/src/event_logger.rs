//! Fare Event Logger
//!
//! Typed progress events of one fare query, emitted on the `fare_events`
//! target. The JSON file layer turns them into one NDJSON line each.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub const FARE_EVENTS_TARGET: &str = "fare_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FareEvent {
    LegStarted {
        leg: String,
        origin: String,
        destination: String,
        days: u32,
    },
    DayExtracted {
        leg: String,
        day: u32,
        date: NaiveDate,
        best: f64,
    },
    StallRecovered {
        leg: String,
        day: u32,
        fallback_ms: u64,
    },
    SessionRestarted {
        reason: String,
    },
    LegFinished {
        leg: String,
        days: u32,
    },
    QueryFailed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FareLogEntry {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: FareEvent,
}

/// Emits events tagged with the id of the query they belong to.
#[derive(Debug, Clone)]
pub struct FareEventLogger {
    query_id: String,
}

impl Default for FareEventLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl FareEventLogger {
    /// Logger for a fresh query with a random id.
    pub fn new() -> Self {
        Self::for_query(Uuid::new_v4().to_string())
    }

    pub fn for_query(query_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn entry(&self, event: FareEvent) -> FareLogEntry {
        FareLogEntry {
            query_id: self.query_id.clone(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log(&self, event: FareEvent) {
        let entry = self.entry(event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: FARE_EVENTS_TARGET, query_id = %entry.query_id, event = %json, "Fare event");
    }
}
