//! Config validation: checks with user-friendly error messages.

use crate::schema::RailfareConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &RailfareConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_site(config, &mut report);
    validate_browser(config, &mut report);
    validate_timing(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_site(config: &RailfareConfig, report: &mut ValidationReport) {
    let site = &config.site;
    if !is_http_url(&site.base_url) {
        report.error("site.baseUrl", "Must be an http(s) URL");
    }

    let s = &site.selectors;
    let selectors = [
        ("originInput", &s.origin_input),
        ("destinationInput", &s.destination_input),
        ("datePanel", &s.date_panel),
        ("currentDay", &s.current_day),
        ("consentButton", &s.consent_button),
        ("searchButton", &s.search_button),
        ("overviewSwitch", &s.overview_switch),
        ("nextDay", &s.next_day),
        ("selectedInterval", &s.selected_interval),
        ("priceButtons", &s.price_buttons),
        ("dateScroller", &s.date_scroller),
    ];
    for (field, value) in selectors {
        if value.trim().is_empty() {
            report.error(format!("site.selectors.{field}"), "Selector cannot be empty");
        }
    }
    // Class lookups take a single class name.
    if s.date_panel.split_whitespace().count() > 1 {
        report.error(
            "site.selectors.datePanel",
            "Must be a single class name, not a CSS selector",
        );
    }
}

fn validate_browser(config: &RailfareConfig, report: &mut ValidationReport) {
    let browser = &config.browser;
    if !is_http_url(&browser.devtools_url) {
        report.error("browser.devtoolsUrl", "Must be an http(s) URL");
    }
    if let Some(exe) = &browser.executable {
        if !exe.exists() {
            report.warn(
                "browser.executable",
                format!("{} does not exist; launch will fail", exe.display()),
            );
        }
    }
    if !browser.extensions.is_empty() && browser.executable.is_none() {
        report.warn(
            "browser.extensions",
            "Extensions are only loaded into a launched browser; set browser.executable",
        );
    }
    for (idx, ext) in browser.extensions.iter().enumerate() {
        if !ext.is_dir() {
            report.error(
                format!("browser.extensions[{idx}]"),
                format!("{} is not an unpacked extension directory", ext.display()),
            );
        }
    }
    if browser.window_width == 0 || browser.window_height == 0 {
        report.error("browser.windowWidth", "Window size must be non-zero");
    }
    if browser.command_timeout_ms == 0 {
        report.error("browser.commandTimeoutMs", "Must be greater than zero");
    }
    if browser.navigation_timeout_ms == 0 {
        report.error("browser.navigationTimeoutMs", "Must be greater than zero");
    }
}

fn validate_timing(config: &RailfareConfig, report: &mut ValidationReport) {
    let timing = &config.timing;
    if timing.element_timeout_ms == 0 {
        report.warn(
            "timing.elementTimeoutMs",
            "Zero timeout; elements that render late will not be found",
        );
    }
    if timing.marker_timeout_ms == 0 {
        report.warn(
            "timing.markerTimeoutMs",
            "Zero timeout; every page advance will fall back to the stall delay",
        );
    }
    if timing.stall_fallback_ms < timing.marker_timeout_ms {
        report.warn(
            "timing.stallFallbackMs",
            "Shorter than the marker timeout; stall recovery is unlikely to help",
        );
    }
}

fn validate_logging(config: &RailfareConfig, report: &mut ValidationReport) {
    let level = config.logging.level.trim();
    let known = ["trace", "debug", "info", "warn", "error", "off"];
    // Anything with '=' or ',' is treated as an env-filter directive.
    let is_directive = level.contains('=') || level.contains(',');
    if !is_directive && !known.contains(&level.to_ascii_lowercase().as_str()) {
        report.error(
            "logging.level",
            format!("Unknown level \"{level}\"; expected one of {}", known.join(", ")),
        );
    }
}
