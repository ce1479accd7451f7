//! Connection assembly.
//!
//! Turns the raw per-day fares of one or two legs into the fare table handed
//! to export: each row gets a derived `best` column right after the date.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::LegTableError;
use crate::types::{DayFare, FareBucket, BUCKET_COUNT};

/// Header of the date column.
pub const DATE_COLUMN: &str = "date";

/// Header of the derived cheapest-of-day column.
pub const BEST_COLUMN: &str = "best";

/// One assembled table row: date, best, then the bucket prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareRow {
    pub date: NaiveDate,
    pub best: f64,
    pub intervals: [f64; BUCKET_COUNT],
}

impl From<&DayFare> for FareRow {
    fn from(day: &DayFare) -> Self {
        Self {
            date: day.date,
            best: day.best(),
            intervals: day.intervals,
        }
    }
}

/// Column headers of an assembled leg, in table order.
pub fn leg_columns() -> Vec<&'static str> {
    let mut columns = vec![DATE_COLUMN, BEST_COLUMN];
    columns.extend(FareBucket::ALL.iter().map(|b| b.label()));
    columns
}

/// Best fares of a route, one table per travelled direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub origin: String,
    pub destination: String,
    pub outward: Vec<FareRow>,
    pub inward: Option<Vec<FareRow>>,
}

impl Connection {
    /// Assemble a connection from extracted leg tables.
    pub fn assemble(
        origin: impl Into<String>,
        destination: impl Into<String>,
        outward: &[DayFare],
        inward: Option<&[DayFare]>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            outward: assemble_leg(outward),
            inward: inward.map(assemble_leg),
        }
    }

    pub fn is_round_trip(&self) -> bool {
        self.inward.is_some()
    }

    /// Sheet (or file) name the connection is exported under.
    pub fn sheet_name(&self) -> String {
        format!("{} -> {}", self.origin, self.destination)
    }
}

fn assemble_leg(days: &[DayFare]) -> Vec<FareRow> {
    days.iter().map(FareRow::from).collect()
}

/// Check that `next` continues a leg whose last extracted day is `previous`.
pub fn check_next_day(previous: NaiveDate, next: NaiveDate) -> Result<(), LegTableError> {
    let expected = previous + Duration::days(1);
    if next != expected {
        return Err(LegTableError::DateGap {
            previous,
            expected,
            found: next,
        });
    }
    Ok(())
}
