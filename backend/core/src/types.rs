use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Number of time-of-day price buckets reported per day.
pub const BUCKET_COUNT: usize = 6;

/// A request for the day-by-day best fares of one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareQuery {
    pub origin: String,
    pub destination: String,
    pub days: u32,
    pub round_trip: bool,
}

impl FareQuery {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        days: u32,
        round_trip: bool,
    ) -> Result<Self, QueryError> {
        let origin = origin.into().trim().to_string();
        let destination = destination.into().trim().to_string();
        if origin.is_empty() {
            return Err(QueryError::BlankStation("origin"));
        }
        if destination.is_empty() {
            return Err(QueryError::BlankStation("destination"));
        }
        if days == 0 {
            return Err(QueryError::ZeroDays);
        }
        Ok(Self {
            origin,
            destination,
            days,
            round_trip,
        })
    }

    /// The inward leg: same horizon, stations swapped.
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            days: self.days,
            round_trip: self.round_trip,
        }
    }
}

/// Direction of travel within a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Outward,
    Inward,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Outward => write!(f, "outward"),
            Leg::Inward => write!(f, "inward"),
        }
    }
}

/// The fixed time-of-day intervals, in the order the site lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FareBucket {
    Night,
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
    LateEvening,
}

impl FareBucket {
    pub const ALL: [FareBucket; BUCKET_COUNT] = [
        FareBucket::Night,
        FareBucket::EarlyMorning,
        FareBucket::Morning,
        FareBucket::Afternoon,
        FareBucket::Evening,
        FareBucket::LateEvening,
    ];

    /// Column label, e.g. `"07-10"`.
    pub fn label(self) -> &'static str {
        match self {
            FareBucket::Night => "00-07",
            FareBucket::EarlyMorning => "07-10",
            FareBucket::Morning => "10-13",
            FareBucket::Afternoon => "13-16",
            FareBucket::Evening => "16-19",
            FareBucket::LateEvening => "19-24",
        }
    }
}

impl fmt::Display for FareBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Prices of one calendar day, one per [`FareBucket`] in [`FareBucket::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFare {
    pub date: NaiveDate,
    pub intervals: [f64; BUCKET_COUNT],
}

impl DayFare {
    pub fn new(date: NaiveDate, intervals: [f64; BUCKET_COUNT]) -> Self {
        Self { date, intervals }
    }

    /// Cheapest price of the day across all buckets.
    pub fn best(&self) -> f64 {
        self.intervals.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn price(&self, bucket: FareBucket) -> f64 {
        self.intervals[bucket as usize]
    }
}

/// Day fares of one leg in pagination order.
pub type LegTable = Vec<DayFare>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_rejects_zero_days() {
        let err = FareQuery::new("Berlin", "Frankfurt", 0, false).unwrap_err();
        assert!(matches!(err, QueryError::ZeroDays));
    }

    #[test]
    fn query_rejects_blank_station() {
        let err = FareQuery::new("  ", "Frankfurt", 3, false).unwrap_err();
        assert!(matches!(err, QueryError::BlankStation("origin")));
    }

    #[test]
    fn reversed_swaps_stations_only() {
        let q = FareQuery::new("Berlin", "Frankfurt", 7, true).unwrap();
        let r = q.reversed();
        assert_eq!(r.origin, "Frankfurt");
        assert_eq!(r.destination, "Berlin");
        assert_eq!(r.days, 7);
        assert!(r.round_trip);
    }

    #[test]
    fn best_is_minimum_of_buckets() {
        let day = DayFare::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            [39.9, 21.9, 17.9, 29.9, 49.9, 17.99],
        );
        assert_eq!(day.best(), 17.9);
        assert_eq!(day.price(FareBucket::Afternoon), 29.9);
    }

    #[test]
    fn bucket_labels_in_site_order() {
        let labels: Vec<_> = FareBucket::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(
            labels,
            ["00-07", "07-10", "10-13", "13-16", "16-19", "19-24"]
        );
    }
}
