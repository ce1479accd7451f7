//! Error types for the browser adapter.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`BrowserDriver`](crate::BrowserDriver).
#[derive(Debug, Error)]
pub enum DriverError {
    /// Failed to reach the DevTools endpoint or open its WebSocket.
    #[error("failed to connect to DevTools at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The browser executable could not be started.
    #[error("failed to launch browser {executable}: {reason}")]
    LaunchFailed { executable: String, reason: String },

    /// A CDP command returned an error response.
    #[error("CDP error {code}: {message}")]
    Cdp { code: i64, message: String },

    /// A CDP command got no response in time.
    #[error("CDP command '{method}' timed out after {duration:?}")]
    CommandTimeout { method: String, duration: Duration },

    /// Malformed or unexpected protocol traffic.
    #[error("protocol error: {detail}")]
    Protocol { detail: String },

    /// No element matches the locator right now.
    #[error("element not found: {locator}")]
    ElementNotFound { locator: String },

    /// No element matched the locator before the wait expired.
    #[error("timed out after {timeout:?} waiting for {locator}")]
    WaitTimeout { locator: String, timeout: Duration },

    #[error("navigation failed: {reason}")]
    NavigationFailed { reason: String },

    #[error("JavaScript exception: {message}")]
    JsException { message: String },

    /// The session was closed; no further commands are accepted.
    #[error("browser session is closed")]
    SessionClosed,
}

impl DriverError {
    /// Whether the error means the element is simply absent.
    pub fn is_missing_element(&self) -> bool {
        matches!(
            self,
            DriverError::ElementNotFound { .. } | DriverError::WaitTimeout { .. }
        )
    }
}
