//! Ownership of the single browser session a query runs in.

use railfare_browser::BrowserDriver;
use tracing::{info, warn};

use crate::error::ScrapeError;

/// Owns one browser session; once closed, no further work is accepted.
pub struct SessionController<D: BrowserDriver> {
    driver: D,
    open: bool,
    restarts: u32,
}

impl<D: BrowserDriver> SessionController<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            open: true,
            restarts: 0,
        }
    }

    /// The live session.
    pub fn driver(&self) -> Result<&D, ScrapeError> {
        if self.open {
            Ok(&self.driver)
        } else {
            Err(ScrapeError::SessionNotReady)
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Sessions replaced since this controller was created.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Replace the session with one that has empty client-side storage.
    pub async fn restart(&mut self) -> Result<(), ScrapeError> {
        if !self.open {
            return Err(ScrapeError::SessionNotReady);
        }
        self.driver.restart_session().await?;
        self.restarts += 1;
        info!(restarts = self.restarts, "Browser session restarted");
        Ok(())
    }

    /// End the session. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<(), ScrapeError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        if let Err(e) = self.driver.close_session().await {
            warn!(error = %e, "Browser session did not close cleanly");
            return Err(e.into());
        }
        info!("Browser session closed");
        Ok(())
    }

    /// The underlying driver, live or not.
    pub fn inner(&self) -> &D {
        &self.driver
    }
}
