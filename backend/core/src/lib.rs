pub mod connection;
pub mod error;
pub mod locale;
pub mod types;

pub use connection::{leg_columns, Connection, FareRow, BEST_COLUMN, DATE_COLUMN};
pub use error::{LegTableError, QueryError};
pub use locale::DateLocale;
pub use types::{DayFare, FareBucket, FareQuery, Leg, LegTable, BUCKET_COUNT};
