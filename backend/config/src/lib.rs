//! `railfare-config` — runtime configuration for the fare scraper.
//!
//! Provides:
//! - Typed config schema (site selectors, browser, timing, export, logging)
//! - YAML read/write with atomic replace
//! - `RAILFARE_*` environment overrides
//! - Default values and validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{
    BrowserConfig, ExportConfig, LoggingConfig, RailfareConfig, SelectorsConfig, SiteConfig,
    TimingConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load a config file and apply environment overrides.
///
/// Not validated: the result configures logging, which has to be up before
/// [`ensure_valid`] reports anything.
pub async fn load_and_prepare(path: &Path) -> Result<RailfareConfig> {
    let config = load_config(path).await?;
    apply_env_overrides(config).context("Failed to apply environment overrides")
}

/// Validate `config`, logging every finding; fails on the first error.
///
/// `source` only names where the config came from in the error message.
pub fn ensure_valid(config: &RailfareConfig, source: &Path) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!(
            "{} ({} config error(s) in {})",
            first,
            report.errors.len(),
            source.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_file_loads_but_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "site:\n  baseUrl: nowhere\n").unwrap();
        let cfg = load_and_prepare(&path).await.unwrap();
        let err = ensure_valid(&cfg, &path).unwrap_err();
        assert!(err.to_string().contains("site.baseUrl"));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[tokio::test]
    async fn load_and_prepare_reads_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "timing:\n  markerTimeoutMs: 2500\n  stallFallbackMs: 9000\nexport:\n  outputDir: out\n",
        )
        .unwrap();
        let cfg = load_and_prepare(&path).await.unwrap();
        assert_eq!(cfg.timing.marker_timeout_ms, 2500);
        assert_eq!(cfg.timing.stall_fallback_ms, 9000);
    }
}
