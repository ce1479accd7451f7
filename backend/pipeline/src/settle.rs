//! Waiting for the fare overview to settle after a page advance.

use std::time::Duration;

use railfare_browser::{BrowserDriver, Locator};
use railfare_config::{SiteConfig, TimingConfig};
use railfare_core::Leg;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// How the view was judged settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The marker appeared within the timeout.
    Marker,
    /// The marker appeared after the fallback delay.
    Recovered,
    /// The marker never appeared; the fallback delay was taken as enough.
    Assumed,
}

impl Settlement {
    pub fn stalled(self) -> bool {
        self != Settlement::Marker
    }
}

/// Marker wait, one back-off and a second wait, then a fixed pause.
#[derive(Debug, Clone)]
pub struct SettlePolicy {
    marker: Locator,
    marker_timeout: Duration,
    fallback: Duration,
    post_delay: Duration,
    fail_on_stall: bool,
}

impl SettlePolicy {
    pub fn from_config(site: &SiteConfig, timing: &TimingConfig) -> Self {
        Self {
            marker: Locator::css(&site.selectors.selected_interval),
            marker_timeout: timing.marker_timeout(),
            fallback: timing.stall_fallback(),
            post_delay: timing.post_advance(),
            fail_on_stall: timing.fail_on_stall,
        }
    }

    pub fn fallback(&self) -> Duration {
        self.fallback
    }

    /// Wait until day `day` of `leg` is displayed.
    ///
    /// Only a missing marker counts as a stall; other driver failures
    /// propagate unchanged.
    pub async fn settle<D>(
        &self,
        driver: &D,
        leg: Leg,
        day: u32,
    ) -> Result<Settlement, ScrapeError>
    where
        D: BrowserDriver + ?Sized,
    {
        let settlement = match driver.wait_for(&self.marker, self.marker_timeout).await {
            Ok(_) => Settlement::Marker,
            Err(e) if e.is_missing_element() => {
                warn!(
                    %leg,
                    day,
                    fallback_ms = self.fallback.as_millis() as u64,
                    "PaginationStallRecovered: settled-day marker missing, backing off"
                );
                sleep(self.fallback).await;
                match driver.wait_for(&self.marker, self.marker_timeout).await {
                    Ok(_) => Settlement::Recovered,
                    Err(e) if e.is_missing_element() => {
                        if self.fail_on_stall {
                            return Err(ScrapeError::PaginationStalled { leg, day });
                        }
                        warn!(%leg, day, "Marker still missing after back-off; proceeding");
                        Settlement::Assumed
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        sleep(self.post_delay).await;
        debug!(%leg, day, ?settlement, "Page settled");
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use railfare_browser::{DriverAction, DriverError, ScriptedDriver};

    use super::*;

    fn policy(fail_on_stall: bool) -> SettlePolicy {
        let timing = TimingConfig {
            fail_on_stall,
            ..TimingConfig::immediate()
        };
        SettlePolicy::from_config(&SiteConfig::default(), &timing)
    }

    fn marker() -> Locator {
        Locator::css(&SiteConfig::default().selectors.selected_interval)
    }

    fn waits(driver: &ScriptedDriver) -> usize {
        driver.count(|a| matches!(a, DriverAction::Wait(_)))
    }

    #[tokio::test]
    async fn marker_present_settles_at_once() {
        let driver = ScriptedDriver::new();
        let settlement = policy(false).settle(&driver, Leg::Outward, 2).await.unwrap();
        assert_eq!(settlement, Settlement::Marker);
        assert_eq!(waits(&driver), 1);
    }

    #[tokio::test]
    async fn late_marker_is_recovered() {
        let driver = ScriptedDriver::new().with_flaky(marker(), 1);
        let settlement = policy(false).settle(&driver, Leg::Outward, 2).await.unwrap();
        assert_eq!(settlement, Settlement::Recovered);
        assert!(settlement.stalled());
        assert_eq!(waits(&driver), 2);
    }

    #[tokio::test]
    async fn absent_marker_proceeds_by_default() {
        let driver = ScriptedDriver::new().with_missing(marker());
        let settlement = policy(false).settle(&driver, Leg::Inward, 4).await.unwrap();
        assert_eq!(settlement, Settlement::Assumed);
    }

    #[tokio::test]
    async fn absent_marker_fails_when_configured() {
        let driver = ScriptedDriver::new().with_missing(marker());
        let err = policy(true).settle(&driver, Leg::Inward, 4).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::PaginationStalled {
                leg: Leg::Inward,
                day: 4
            }
        ));
    }

    #[tokio::test]
    async fn closed_session_is_not_a_stall() {
        let mut driver = ScriptedDriver::new();
        driver.close_session().await.unwrap();
        let err = policy(false).settle(&driver, Leg::Outward, 2).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Driver(DriverError::SessionClosed)));
    }
}
