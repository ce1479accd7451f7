//! Config defaults: the values the fare site was last observed to need.

use std::path::PathBuf;

use railfare_core::DateLocale;

use crate::schema::{
    BrowserConfig, ExportConfig, LoggingConfig, SelectorsConfig, SiteConfig, TimingConfig,
};

/// Home page of the English-language booking site.
pub const DEFAULT_BASE_URL: &str = "https://int.bahn.de/en/";

pub const DEFAULT_DEVTOOLS_URL: &str = "http://127.0.0.1:9222";

pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_PICKER_SETTLE_MS: u64 = 500;
pub const DEFAULT_SEARCH_SETTLE_MS: u64 = 3_000;
pub const DEFAULT_SWITCH_SETTLE_MS: u64 = 3_000;
pub const DEFAULT_READY_SETTLE_MS: u64 = 1_000;
pub const DEFAULT_MARKER_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_STALL_FALLBACK_MS: u64 = 15_000;
pub const DEFAULT_POST_ADVANCE_MS: u64 = 500;

pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_OUTPUT_DIR: &str = "fares";

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            date_locale: DateLocale::English,
            selectors: SelectorsConfig::default(),
        }
    }
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            origin_input: "quickFinderBasic-von".into(),
            destination_input: "quickFinderBasic-nach".into(),
            date_panel: "quick-finder-option-area__heading".into(),
            current_day: "div.db-web-date-picker-calendar-day\
                          .db-web-date-picker-calendar-day--day-in-month-or-selectable\
                          .db-web-date-picker-calendar-day--selected-date\
                          .db-web-date-picker-calendar-day--current-date"
                .into(),
            consent_button: "._button".into(),
            search_button:
                "button.db-web-button:nth-child(3) > span:nth-child(1) > span:nth-child(1)".into(),
            overview_switch: ".db-web-switch-list__button-container--align-top > span:nth-child(2)"
                .into(),
            next_day: "span.icon-next2:nth-child(2)".into(),
            selected_interval: ".tagesbestpreis-intervall--selected".into(),
            price_buttons: "span.tagesbestpreis-intervall__button-text".into(),
            date_scroller: "div.db-web-date-scroller__date".into(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            devtools_url: DEFAULT_DEVTOOLS_URL.into(),
            executable: None,
            headless: true,
            window_width: 1400,
            window_height: 1000,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            extensions: Vec::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            picker_settle_ms: DEFAULT_PICKER_SETTLE_MS,
            search_settle_ms: DEFAULT_SEARCH_SETTLE_MS,
            switch_settle_ms: DEFAULT_SWITCH_SETTLE_MS,
            ready_settle_ms: DEFAULT_READY_SETTLE_MS,
            marker_timeout_ms: DEFAULT_MARKER_TIMEOUT_MS,
            stall_fallback_ms: DEFAULT_STALL_FALLBACK_MS,
            post_advance_ms: DEFAULT_POST_ADVANCE_MS,
            fail_on_stall: false,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.into(),
            dir: None,
        }
    }
}
