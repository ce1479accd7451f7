//! Capability contract between the fare pipeline and a browser.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use crate::error::DriverError;
use crate::locator::Locator;

/// Pause between lookups while waiting for an element.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Handle to an element resolved by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// Driver-specific identity (a CDP remote object id for [`CdpDriver`](crate::CdpDriver)).
    pub id: String,
    pub locator: Locator,
}

/// Operations the pipeline needs from an automated browser session.
///
/// Every call completes or fails before returning; the pipeline never issues
/// two calls at once.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load `url` in the session's page and wait for the document to finish loading.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Type `text` into the element matched by `locator`.
    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    async fn click(&self, locator: &Locator) -> Result<(), DriverError>;

    /// Resolve `locator` now, without waiting.
    async fn find_element(&self, locator: &Locator) -> Result<NodeRef, DriverError>;

    /// Resolve `locator`, polling until it appears or `timeout` elapses.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<NodeRef, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(locator).await {
                Ok(node) => return Ok(node),
                Err(DriverError::ElementNotFound { .. }) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(DriverError::WaitTimeout {
                            locator: locator.to_string(),
                            timeout,
                        });
                    }
                    sleep(POLL_INTERVAL.min(deadline - now)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Serialized markup of the whole current document.
    async fn current_markup_snapshot(&self) -> Result<String, DriverError>;

    /// Replace the session with a fresh one that shares no client-side storage.
    async fn restart_session(&mut self) -> Result<(), DriverError>;

    /// End the session. Later calls fail with [`DriverError::SessionClosed`].
    async fn close_session(&mut self) -> Result<(), DriverError>;
}
