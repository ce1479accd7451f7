//! Day-by-day pagination through the fare overview.

use std::time::Duration;

use logging::{FareEvent, FareEventLogger};
use railfare_browser::{BrowserDriver, Locator};
use railfare_config::{SiteConfig, TimingConfig};
use railfare_core::connection::check_next_day;
use railfare_core::{Leg, LegTable, LegTableError};
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::extract::FareExtractor;
use crate::settle::SettlePolicy;

/// Captures one day per page and clicks "next day" between captures.
///
/// For a horizon of `n` days this takes `n` snapshots and clicks `n - 1`
/// times. Any failure discards the days collected so far.
#[derive(Debug, Clone)]
pub struct DayPaginator {
    extractor: FareExtractor,
    settle: SettlePolicy,
    next_day: Locator,
    element_timeout: Duration,
}

impl DayPaginator {
    pub fn new(
        extractor: FareExtractor,
        settle: SettlePolicy,
        site: &SiteConfig,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            extractor,
            settle,
            next_day: Locator::css(&site.selectors.next_day),
            element_timeout: timing.element_timeout(),
        }
    }

    pub async fn collect<D>(
        &self,
        driver: &D,
        days: u32,
        leg: Leg,
        events: &FareEventLogger,
    ) -> Result<LegTable, ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        let mut table = LegTable::with_capacity(days as usize);

        for day in 1..=days {
            let markup = driver.current_markup_snapshot().await?;
            let fare = self
                .extractor
                .extract(&markup)
                .map_err(|source| ScrapeError::Extraction { leg, day, source })?;

            if let Some(previous) = table.last() {
                if let Err(LegTableError::DateGap {
                    expected, found, ..
                }) = check_next_day(previous.date, fare.date)
                {
                    return Err(ScrapeError::DateGap {
                        leg,
                        day,
                        expected,
                        found,
                    });
                }
            }

            debug!(%leg, day, date = %fare.date, best = fare.best(), "Extracted day");
            events.log(FareEvent::DayExtracted {
                leg: leg.to_string(),
                day,
                date: fare.date,
                best: fare.best(),
            });
            table.push(fare);

            if day == days {
                break;
            }

            driver.wait_for(&self.next_day, self.element_timeout).await?;
            driver.click(&self.next_day).await?;

            let settlement = self.settle.settle(driver, leg, day + 1).await?;
            if settlement.stalled() {
                events.log(FareEvent::StallRecovered {
                    leg: leg.to_string(),
                    day: day + 1,
                    fallback_ms: self.settle.fallback().as_millis() as u64,
                });
            }
        }

        info!(%leg, days = table.len(), "Leg complete");
        Ok(table)
    }
}
