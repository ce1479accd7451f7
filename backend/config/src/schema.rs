//! railfare configuration schema.
//!
//! Typed for serde YAML deserialization. Every section and field has a
//! default, so a partial (or missing) file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use railfare_core::DateLocale;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RailfareConfig {
    /// Fare site address, date locale and element selectors
    pub site: SiteConfig,

    /// How to reach or launch the browser
    pub browser: BrowserConfig,

    /// Element waits and settle delays
    pub timing: TimingConfig,

    /// Where fare tables are written
    pub export: ExportConfig,

    /// Log level and log file directory
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub base_url: String,
    pub date_locale: DateLocale,
    pub selectors: SelectorsConfig,
}

/// Element contract of the fare site.
///
/// Each field documents the kind of locator the pipeline builds from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorsConfig {
    /// `name` attribute of the origin input
    pub origin_input: String,
    /// `name` attribute of the destination input
    pub destination_input: String,
    /// Class of the heading that opens the date/time options
    pub date_panel: String,
    /// CSS of the highlighted "today" cell in the date picker
    pub current_day: String,
    /// CSS of the consent dialog's accept button
    pub consent_button: String,
    /// CSS of the search button
    pub search_button: String,
    /// CSS of the toggle switching results to the day overview
    pub overview_switch: String,
    /// CSS of the "next day" arrow of the date scroller
    pub next_day: String,
    /// CSS of the marker shown once a day's prices are rendered
    pub selected_interval: String,
    /// CSS of the price labels, one per time-of-day bucket
    pub price_buttons: String,
    /// CSS of the date scroller's current date
    pub date_scroller: String,
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
    /// DevTools HTTP endpoint
    pub devtools_url: String,
    /// Chromium executable to launch; attach to a running browser when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub command_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    /// Unpacked extension directories loaded into a launched browser
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<PathBuf>,
}

impl BrowserConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingConfig {
    /// Bound on every required element lookup
    pub element_timeout_ms: u64,
    /// Pause after opening the date panel
    pub picker_settle_ms: u64,
    /// Pause after submitting the search
    pub search_settle_ms: u64,
    /// Pause after switching to the day overview
    pub switch_settle_ms: u64,
    /// Pause before the first capture of a leg
    pub ready_settle_ms: u64,
    /// Bound on the settled-day marker after a page advance
    pub marker_timeout_ms: u64,
    /// Back-off when the marker did not show up
    pub stall_fallback_ms: u64,
    /// Pause applied after every page advance
    pub post_advance_ms: u64,
    /// Fail the leg when the marker is still missing after the back-off
    pub fail_on_stall: bool,
}

impl TimingConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn picker_settle(&self) -> Duration {
        Duration::from_millis(self.picker_settle_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }

    pub fn switch_settle(&self) -> Duration {
        Duration::from_millis(self.switch_settle_ms)
    }

    pub fn ready_settle(&self) -> Duration {
        Duration::from_millis(self.ready_settle_ms)
    }

    pub fn marker_timeout(&self) -> Duration {
        Duration::from_millis(self.marker_timeout_ms)
    }

    pub fn stall_fallback(&self) -> Duration {
        Duration::from_millis(self.stall_fallback_ms)
    }

    pub fn post_advance(&self) -> Duration {
        Duration::from_millis(self.post_advance_ms)
    }

    /// All waits and pauses zeroed; used by tests driving a scripted browser.
    pub fn immediate() -> Self {
        Self {
            element_timeout_ms: 0,
            picker_settle_ms: 0,
            search_settle_ms: 0,
            switch_settle_ms: 0,
            ready_settle_ms: 0,
            marker_timeout_ms: 0,
            stall_fallback_ms: 0,
            post_advance_ms: 0,
            fail_on_stall: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Export / logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Directory holding one CSV sheet per connection
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Directory for rolling JSON logs; console only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}
