//! Environment overrides applied on top of the loaded config file.
//!
//! Recognised variables:
//! - `RAILFARE_DEVTOOLS_URL` → `browser.devtoolsUrl`
//! - `RAILFARE_CHROME` → `browser.executable`
//! - `RAILFARE_HEADLESS` → `browser.headless` (`1/0`, `true/false`, `yes/no`)
//! - `RAILFARE_LOG_LEVEL` → `logging.level`
//! - `RAILFARE_OUTPUT_DIR` → `export.outputDir`
//!
//! Empty values are ignored.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::schema::RailfareConfig;

pub const ENV_DEVTOOLS_URL: &str = "RAILFARE_DEVTOOLS_URL";
pub const ENV_CHROME: &str = "RAILFARE_CHROME";
pub const ENV_HEADLESS: &str = "RAILFARE_HEADLESS";
pub const ENV_LOG_LEVEL: &str = "RAILFARE_LOG_LEVEL";
pub const ENV_OUTPUT_DIR: &str = "RAILFARE_OUTPUT_DIR";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: RailfareConfig) -> Result<RailfareConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: RailfareConfig,
    env: &HashMap<String, String>,
) -> Result<RailfareConfig> {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_DEVTOOLS_URL) {
        config.browser.devtools_url = url.to_string();
    }
    if let Some(exe) = get(ENV_CHROME) {
        config.browser.executable = Some(PathBuf::from(exe));
    }
    if let Some(raw) = get(ENV_HEADLESS) {
        config.browser.headless = parse_flag(ENV_HEADLESS, raw)?;
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.level = level.to_string();
    }
    if let Some(dir) = get(ENV_OUTPUT_DIR) {
        config.export.output_dir = PathBuf::from(dir);
    }
    Ok(config)
}

fn parse_flag(var: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{var} must be a boolean flag, got \"{other}\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn overrides_browser_and_output() {
        let cfg = apply_env_overrides_with(
            RailfareConfig::default(),
            &env(&[
                (ENV_DEVTOOLS_URL, "http://10.0.0.2:9333"),
                (ENV_CHROME, "/usr/bin/chromium"),
                (ENV_HEADLESS, "no"),
                (ENV_OUTPUT_DIR, "/tmp/fares"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.browser.devtools_url, "http://10.0.0.2:9333");
        assert_eq!(cfg.browser.executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.export.output_dir, PathBuf::from("/tmp/fares"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let cfg = apply_env_overrides_with(
            RailfareConfig::default(),
            &env(&[(ENV_LOG_LEVEL, "  "), (ENV_CHROME, "")]),
        )
        .unwrap();
        assert_eq!(cfg, RailfareConfig::default());
    }

    #[test]
    fn rejects_non_boolean_headless() {
        let err = apply_env_overrides_with(
            RailfareConfig::default(),
            &env(&[(ENV_HEADLESS, "maybe")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(ENV_HEADLESS));
    }
}
