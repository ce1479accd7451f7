//! Fare scraping pipeline: search, day pagination, extraction and the
//! session that ties them together.

pub mod error;
#[cfg(test)]
mod event_capture;
pub mod extract;
pub mod fetch;
pub mod pagination;
pub mod search;
pub mod session;
pub mod settle;

pub use error::{ExtractionError, ScrapeError};
pub use extract::{parse_price, parse_scroller_date, FareExtractor};
pub use fetch::FareScraper;
pub use pagination::DayPaginator;
pub use search::{SearchProtocol, SearchStep};
pub use session::SessionController;
pub use settle::{SettlePolicy, Settlement};
