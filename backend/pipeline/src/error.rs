//! Error types for fare scraping.

use chrono::NaiveDate;
use railfare_browser::DriverError;
use railfare_core::{DateLocale, Leg};
use thiserror::Error;

use crate::search::SearchStep;

/// Why a fare-overview snapshot could not be turned into a day of fares.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractionError {
    #[error("expected {expected} price buckets, found {found}")]
    BucketCount { expected: usize, found: usize },

    #[error("price bucket {bucket} is not a number: {text:?}")]
    MalformedPrice { bucket: usize, text: String },

    #[error("no date scroller in snapshot")]
    MissingDate,

    #[error("unreadable date {text:?}")]
    MalformedDate { text: String },

    #[error("unknown month {token:?} for locale {locale}")]
    UnknownMonth { token: String, locale: DateLocale },

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

/// A failed fare query. Every variant except [`ScrapeError::Driver`] is
/// raised by the pipeline itself; all of them abort the whole query.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no live browser session")]
    SessionNotReady,

    #[error("search step '{step}' failed on {locator}: {source}")]
    Navigation {
        step: SearchStep,
        locator: String,
        #[source]
        source: DriverError,
    },

    #[error("{leg} leg, day {day}: page never settled after advancing")]
    PaginationStalled { leg: Leg, day: u32 },

    #[error("{leg} leg, day {day}: {source}")]
    Extraction {
        leg: Leg,
        day: u32,
        #[source]
        source: ExtractionError,
    },

    #[error("{leg} leg, day {day}: expected {expected}, page showed {found}")]
    DateGap {
        leg: Leg,
        day: u32,
        expected: NaiveDate,
        found: NaiveDate,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ScrapeError {
    /// 1-based day of the leg the error was raised on, if any.
    pub fn day(&self) -> Option<u32> {
        match self {
            ScrapeError::PaginationStalled { day, .. }
            | ScrapeError::Extraction { day, .. }
            | ScrapeError::DateGap { day, .. } => Some(*day),
            _ => None,
        }
    }

    /// Leg the error was raised on, if it happened while paginating.
    pub fn leg(&self) -> Option<Leg> {
        match self {
            ScrapeError::PaginationStalled { leg, .. }
            | ScrapeError::Extraction { leg, .. }
            | ScrapeError::DateGap { leg, .. } => Some(*leg),
            _ => None,
        }
    }
}
