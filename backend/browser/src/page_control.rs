//! Page Control Actions
//!
//! [`CdpDriver`]: the [`BrowserDriver`] implementation backed by Chrome
//! DevTools. Each session is a page target inside its own browser context, so
//! restarting the session drops cookies and local storage with the context.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::cdp_client::CdpClient;
use crate::driver::{BrowserDriver, NodeRef};
use crate::element_query::{
    resolve_expression, CLICK_FUNCTION, FOCUS_AND_CLEAR_FUNCTION, OUTER_HTML_EXPRESSION,
    READY_STATE_EXPRESSION,
};
use crate::error::DriverError;
use crate::launch::{discover_ws_url, ChromeProcess, DEFAULT_WINDOW};
use crate::locator::Locator;

/// How to reach (or start) the browser.
#[derive(Debug, Clone)]
pub struct CdpOptions {
    /// DevTools HTTP endpoint, e.g. `http://127.0.0.1:9222`.
    pub devtools_url: String,
    /// Browser to launch; when `None` an already running browser is used.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window: (u32, u32),
    pub command_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Unpacked extension directories loaded into a launched browser.
    pub extensions: Vec<PathBuf>,
}

impl Default for CdpOptions {
    fn default() -> Self {
        Self {
            devtools_url: "http://127.0.0.1:9222".into(),
            executable: None,
            headless: true,
            window: DEFAULT_WINDOW,
            command_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(30),
            extensions: Vec::new(),
        }
    }
}

/// Identifiers of the page target backing the current session.
#[derive(Debug, Clone)]
struct PageSession {
    context_id: String,
    target_id: String,
    session_id: String,
}

pub struct CdpDriver {
    client: CdpClient,
    page: Option<PageSession>,
    browser: Option<ChromeProcess>,
    navigation_timeout: Duration,
}

impl CdpDriver {
    /// Launch or attach to a browser and open a fresh page session.
    pub async fn connect(options: &CdpOptions) -> Result<Self, DriverError> {
        let browser = match &options.executable {
            Some(exe) => Some(ChromeProcess::launch(
                exe,
                &options.devtools_url,
                options.headless,
                options.window,
                &options.extensions,
            )?),
            None => None,
        };

        match attach(options).await {
            Ok((client, page)) => Ok(Self {
                client,
                page: Some(page),
                browser,
                navigation_timeout: options.navigation_timeout,
            }),
            Err(e) => {
                if let Some(browser) = browser {
                    browser.shutdown().await;
                }
                Err(e)
            }
        }
    }

    fn session_id(&self) -> Result<&str, DriverError> {
        self.page
            .as_ref()
            .map(|p| p.session_id.as_str())
            .ok_or(DriverError::SessionClosed)
    }

    async fn page_command(&self, method: &str, params: Value) -> Result<Value, DriverError> {
        let session = self.session_id()?;
        self.client
            .send_session_command(session, method, params)
            .await
    }

    /// Evaluate `expression` and return its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value, DriverError> {
        let result = self
            .page_command(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;
        check_exception(&result)?;
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn call_on(&self, node: &NodeRef, function: &str) -> Result<(), DriverError> {
        let result = self
            .page_command(
                "Runtime.callFunctionOn",
                json!({ "objectId": node.id, "functionDeclaration": function }),
            )
            .await?;
        check_exception(&result)
    }

    async fn wait_until_loaded(&self) -> Result<(), DriverError> {
        let deadline = Instant::now() + self.navigation_timeout;
        loop {
            let state = self.evaluate(READY_STATE_EXPRESSION).await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::NavigationFailed {
                    reason: format!(
                        "document still {state} after {:?}",
                        self.navigation_timeout
                    ),
                });
            }
            sleep(Duration::from_millis(100)).await;
        }
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        info!("Navigating browser tab to {}", url);
        let result = self.page_command("Page.navigate", json!({ "url": url })).await?;
        if let Some(error_text) = result.get("errorText").and_then(Value::as_str) {
            return Err(DriverError::NavigationFailed {
                reason: error_text.to_string(),
            });
        }
        self.wait_until_loaded().await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        let node = self.find_element(locator).await?;
        self.call_on(&node, FOCUS_AND_CLEAR_FUNCTION).await?;
        debug!(%locator, chars = text.chars().count(), "Typing into element");
        self.page_command("Input.insertText", json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        let node = self.find_element(locator).await?;
        debug!(%locator, "Clicking element");
        self.call_on(&node, CLICK_FUNCTION).await
    }

    async fn find_element(&self, locator: &Locator) -> Result<NodeRef, DriverError> {
        let result = self
            .page_command(
                "Runtime.evaluate",
                json!({ "expression": resolve_expression(locator), "returnByValue": false }),
            )
            .await?;
        check_exception(&result)?;
        match result
            .get("result")
            .and_then(|r| r.get("objectId"))
            .and_then(Value::as_str)
        {
            Some(object_id) => Ok(NodeRef {
                id: object_id.to_string(),
                locator: locator.clone(),
            }),
            None => Err(DriverError::ElementNotFound {
                locator: locator.to_string(),
            }),
        }
    }

    async fn current_markup_snapshot(&self) -> Result<String, DriverError> {
        match self.evaluate(OUTER_HTML_EXPRESSION).await? {
            Value::String(html) => Ok(html),
            other => Err(DriverError::Protocol {
                detail: format!("outerHTML evaluated to {other}"),
            }),
        }
    }

    async fn restart_session(&mut self) -> Result<(), DriverError> {
        if let Some(page) = self.page.take() {
            close_page(&self.client, &page).await;
        }
        self.page = Some(open_page(&self.client).await?);
        info!("Browser session restarted");
        Ok(())
    }

    async fn close_session(&mut self) -> Result<(), DriverError> {
        if let Some(page) = self.page.take() {
            close_page(&self.client, &page).await;
        }
        if let Some(browser) = self.browser.take() {
            browser.shutdown().await;
        }
        info!("Browser session closed");
        Ok(())
    }
}

/// Create an isolated browser context with one attached page target.
async fn attach(options: &CdpOptions) -> Result<(CdpClient, PageSession), DriverError> {
    let ws_url = discover_ws_url(&options.devtools_url, options.command_timeout).await?;
    let client = CdpClient::connect(&ws_url, options.command_timeout).await?;
    let page = open_page(&client).await?;
    Ok((client, page))
}

async fn open_page(client: &CdpClient) -> Result<PageSession, DriverError> {
    let context = client
        .send_command("Target.createBrowserContext", json!({ "disposeOnDetach": true }))
        .await?;
    let context_id = string_field(&context, "browserContextId")?;

    let target = client
        .send_command(
            "Target.createTarget",
            json!({ "url": "about:blank", "browserContextId": context_id }),
        )
        .await?;
    let target_id = string_field(&target, "targetId")?;

    let attached = client
        .send_command(
            "Target.attachToTarget",
            json!({ "targetId": target_id, "flatten": true }),
        )
        .await?;
    let session_id = string_field(&attached, "sessionId")?;

    for domain in ["Page", "Runtime"] {
        client
            .send_session_command(&session_id, &format!("{domain}.enable"), json!({}))
            .await?;
    }

    debug!(%context_id, %target_id, "Opened page session");
    Ok(PageSession {
        context_id,
        target_id,
        session_id,
    })
}

/// Best-effort teardown; a page that is already gone is not an error.
async fn close_page(client: &CdpClient, page: &PageSession) {
    if let Err(e) = client
        .send_command("Target.closeTarget", json!({ "targetId": page.target_id }))
        .await
    {
        warn!(error = %e, "Failed to close page target");
    }
    if let Err(e) = client
        .send_command(
            "Target.disposeBrowserContext",
            json!({ "browserContextId": page.context_id }),
        )
        .await
    {
        debug!(error = %e, "Browser context already disposed");
    }
}

fn string_field(value: &Value, field: &str) -> Result<String, DriverError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DriverError::Protocol {
            detail: format!("missing '{field}' in {value}"),
        })
}

fn check_exception(result: &Value) -> Result<(), DriverError> {
    let Some(details) = result.get("exceptionDetails") else {
        return Ok(());
    };
    let message = details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("unknown exception");
    Err(DriverError::JsException {
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_description_is_preferred() {
        let result = json!({
            "result": { "type": "object" },
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": { "description": "TypeError: x is null" }
            }
        });
        let err = check_exception(&result).unwrap_err();
        assert!(matches!(err, DriverError::JsException { message } if message == "TypeError: x is null"));
    }

    #[test]
    fn clean_result_has_no_exception() {
        assert!(check_exception(&json!({ "result": { "type": "string", "value": "ok" } })).is_ok());
    }

    #[test]
    fn missing_field_is_protocol_error() {
        let err = string_field(&json!({ "other": 1 }), "targetId").unwrap_err();
        assert!(matches!(err, DriverError::Protocol { .. }));
        assert_eq!(
            string_field(&json!({ "targetId": "T1" }), "targetId").unwrap(),
            "T1"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_attach_removes_launched_profile() {
        let profile = crate::launch::profile_dir();
        std::fs::create_dir_all(&profile).unwrap();
        let options = CdpOptions {
            devtools_url: "http://127.0.0.1:9".into(),
            executable: Some(PathBuf::from("true")),
            command_timeout: Duration::ZERO,
            ..CdpOptions::default()
        };

        let err = CdpDriver::connect(&options).await.err().unwrap();
        assert!(matches!(err, DriverError::ConnectionFailed { .. }));
        assert!(!profile.exists());
    }

    #[test]
    fn default_options_attach_to_local_endpoint() {
        let options = CdpOptions::default();
        assert_eq!(options.devtools_url, "http://127.0.0.1:9222");
        assert!(options.executable.is_none());
        assert!(options.headless);
    }
}
