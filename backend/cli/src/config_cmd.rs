//! `railfare config`: show what a fetch would run with, or write it out.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use railfare_config::{validate, write_config, RailfareConfig};

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub init: bool,

    /// With --init, replace an existing config file
    #[arg(long, requires = "init")]
    pub force: bool,
}

pub async fn run(args: &ConfigArgs, config: &RailfareConfig, source: &Path) -> Result<()> {
    if args.init {
        return init(config, source, args.force).await;
    }

    if source.exists() {
        note_info(&format!("Config file: {}", source.display()));
    } else {
        note_info(&format!(
            "No config file at {}; showing defaults",
            source.display()
        ));
    }

    let yaml = serde_yaml::to_string(config).context("Failed to render config as YAML")?;
    println!("{yaml}");

    let report = validate(config);
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    if !report.is_valid() {
        bail!("{} config error(s)", report.errors.len());
    }
    note_success("Config is valid");
    Ok(())
}

async fn init(config: &RailfareConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to replace it",
            path.display()
        );
    }
    write_config(config, path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use railfare_config::load_config;

    use super::*;

    fn init_args(force: bool) -> ConfigArgs {
        ConfigArgs { init: true, force }
    }

    #[tokio::test]
    async fn init_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("railfare").join("config.yaml");
        let mut config = RailfareConfig::default();
        config.timing.fail_on_stall = true;

        run(&init_args(false), &config, &path).await.unwrap();

        assert_eq!(load_config(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn init_keeps_an_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "export:\n  outputDir: mine\n").unwrap();

        let err = run(&init_args(false), &RailfareConfig::default(), &path)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("mine"));

        run(&init_args(true), &RailfareConfig::default(), &path)
            .await
            .unwrap();
        assert_eq!(
            load_config(&path).await.unwrap(),
            RailfareConfig::default()
        );
    }
}
