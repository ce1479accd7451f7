//! Local Chromium process and DevTools endpoint discovery.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::DriverError;

/// Default window size of launched browsers.
pub const DEFAULT_WINDOW: (u32, u32) = (1400, 1000);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    web_socket_debugger_url: String,
}

/// A browser started by us; killed on [`ChromeProcess::shutdown`] or drop.
pub struct ChromeProcess {
    child: Child,
    profile_dir: PathBuf,
}

impl ChromeProcess {
    /// Start `executable` with remote debugging on the port of `devtools_url`.
    ///
    /// Unpacked extensions in `extensions` are loaded into the fresh profile.
    pub fn launch(
        executable: &Path,
        devtools_url: &str,
        headless: bool,
        window: (u32, u32),
        extensions: &[PathBuf],
    ) -> Result<Self, DriverError> {
        let launch_err = |reason: String| DriverError::LaunchFailed {
            executable: executable.display().to_string(),
            reason,
        };

        let port = Url::parse(devtools_url)
            .ok()
            .and_then(|u| u.port_or_known_default())
            .ok_or_else(|| launch_err(format!("no port in devtools url {devtools_url}")))?;
        let profile_dir = profile_dir();

        let mut command = Command::new(executable);
        command
            .args(launch_args(port, &profile_dir, headless, window, extensions))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| launch_err(e.to_string()))?;
        info!(
            executable = %executable.display(),
            port,
            headless,
            extensions = extensions.len(),
            "Launched browser"
        );
        Ok(Self { child, profile_dir })
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "Failed to kill browser process");
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!(error = %e, dir = %self.profile_dir.display(), "Profile dir not removed");
        }
    }
}

/// Throwaway profile of browsers launched by this process.
pub(crate) fn profile_dir() -> PathBuf {
    std::env::temp_dir().join(format!("railfare-profile-{}", std::process::id()))
}

/// Command line of a launched browser; the start URL comes last.
fn launch_args(
    port: u16,
    profile_dir: &Path,
    headless: bool,
    window: (u32, u32),
    extensions: &[PathBuf],
) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={port}"),
        format!("--user-data-dir={}", profile_dir.display()),
        format!("--window-size={},{}", window.0, window.1),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }
    if !extensions.is_empty() {
        let list = extensions
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        args.push(format!("--disable-extensions-except={list}"));
        args.push(format!("--load-extension={list}"));
    }
    args.push("about:blank".to_string());
    args
}

/// Ask the DevTools HTTP endpoint for the browser WebSocket URL.
///
/// Retries until `timeout` so a freshly launched browser has time to open its port.
pub async fn discover_ws_url(devtools_url: &str, timeout: Duration) -> Result<String, DriverError> {
    let version_url = format!("{}/json/version", devtools_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    let deadline = Instant::now() + timeout;

    loop {
        let attempt = async {
            client
                .get(&version_url)
                .send()
                .await?
                .error_for_status()?
                .json::<VersionInfo>()
                .await
        };
        match attempt.await {
            Ok(info) => {
                debug!(ws = %info.web_socket_debugger_url, "Discovered DevTools endpoint");
                return Ok(info.web_socket_debugger_url);
            }
            Err(e) if Instant::now() >= deadline => {
                return Err(DriverError::ConnectionFailed {
                    url: version_url,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                debug!(error = %e, "DevTools endpoint not ready");
                sleep(Duration::from_millis(200)).await;
            }
        }
    }
}
