//! One fare query, end to end: search, paginate, and for a round trip the
//! same again on a fresh session with the stations swapped.

use logging::{FareEvent, FareEventLogger};
use railfare_browser::BrowserDriver;
use railfare_config::RailfareConfig;
use railfare_core::{Connection, FareQuery, Leg, LegTable};
use tracing::{error, info, warn};

use crate::error::{ExtractionError, ScrapeError};
use crate::extract::FareExtractor;
use crate::pagination::DayPaginator;
use crate::search::SearchProtocol;
use crate::session::SessionController;
use crate::settle::SettlePolicy;

#[derive(Debug, Clone)]
pub struct FareScraper {
    search: SearchProtocol,
    paginator: DayPaginator,
}

impl FareScraper {
    /// Build the pipeline from config; fails only on a CSS selector that
    /// does not parse.
    pub fn from_config(config: &RailfareConfig) -> Result<Self, ExtractionError> {
        let site = &config.site;
        let timing = &config.timing;
        Ok(Self {
            search: SearchProtocol::from_config(site, timing)?,
            paginator: DayPaginator::new(
                FareExtractor::from_config(site)?,
                SettlePolicy::from_config(site, timing),
                site,
                timing,
            ),
        })
    }

    /// Fetch the fares of `query` and close the session, whatever the outcome.
    ///
    /// No partial connection is returned: a failure on either leg fails the
    /// whole query.
    pub async fn fetch_connection<D: BrowserDriver>(
        &self,
        session: &mut SessionController<D>,
        query: &FareQuery,
        events: &FareEventLogger,
    ) -> Result<Connection, ScrapeError> {
        let result = self.run_query(session, query, events).await;
        let closed = session.close().await;

        match result {
            Ok(connection) => {
                closed?;
                info!(
                    origin = %connection.origin,
                    destination = %connection.destination,
                    round_trip = connection.is_round_trip(),
                    "Connection fetched"
                );
                Ok(connection)
            }
            Err(e) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Close after failed query also failed");
                }
                error!(error = %e, "Fare query failed");
                events.log(FareEvent::QueryFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_query<D: BrowserDriver>(
        &self,
        session: &mut SessionController<D>,
        query: &FareQuery,
        events: &FareEventLogger,
    ) -> Result<Connection, ScrapeError> {
        let outward = self
            .run_leg(session.driver()?, query, Leg::Outward, events)
            .await?;

        let inward = if query.round_trip {
            // The site remembers the picked date per session; a fresh one
            // starts the inward leg on day 1 again.
            session.restart().await?;
            events.log(FareEvent::SessionRestarted {
                reason: "inward leg".into(),
            });
            let reversed = query.reversed();
            Some(
                self.run_leg(session.driver()?, &reversed, Leg::Inward, events)
                    .await?,
            )
        } else {
            None
        };

        Ok(Connection::assemble(
            &query.origin,
            &query.destination,
            &outward,
            inward.as_deref(),
        ))
    }

    async fn run_leg<D: BrowserDriver>(
        &self,
        driver: &D,
        query: &FareQuery,
        leg: Leg,
        events: &FareEventLogger,
    ) -> Result<LegTable, ScrapeError> {
        events.log(FareEvent::LegStarted {
            leg: leg.to_string(),
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            days: query.days,
        });
        self.search.run(driver, query).await?;
        let table = self
            .paginator
            .collect(driver, query.days, leg, events)
            .await?;
        events.log(FareEvent::LegFinished {
            leg: leg.to_string(),
            days: table.len() as u32,
        });
        Ok(table)
    }
}
