use chrono::NaiveDate;
use thiserror::Error;

/// Rejected [`FareQuery`](crate::FareQuery) input.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0} station must not be blank")]
    BlankStation(&'static str),

    #[error("day horizon must be at least 1")]
    ZeroDays,
}

/// A leg table that breaks the one-day-per-step calendar walk.
#[derive(Debug, Error, PartialEq)]
pub enum LegTableError {
    #[error("expected {expected} after {previous}, found {found}")]
    DateGap {
        previous: NaiveDate,
        expected: NaiveDate,
        found: NaiveDate,
    },
}
