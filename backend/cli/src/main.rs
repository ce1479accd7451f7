mod config_cmd;
mod fetch_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config_cmd::ConfigArgs;
use fetch_cmd::FetchArgs;
use railfare_config::{config_dir, config_file_path, load_and_prepare};

#[derive(Parser)]
#[command(name = "railfare")]
#[command(about = "Day-by-day best train fares for a route")]
#[command(version)]
struct Cli {
    /// Config file (default: $RAILFARE_CONFIG_DIR/config.yaml or ~/.railfare/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch best fares for the next days and write them to a sheet
    Fetch(FetchArgs),
    /// Print the effective configuration and its validation report
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path).await?;

    logging::init_logger(config.logging.dir.as_deref(), &config.logging.level);

    match cli.command {
        Commands::Fetch(args) => {
            railfare_config::ensure_valid(&config, &path)?;
            if let Err(e) = fetch_cmd::run(args, config).await {
                terminal_output::note_error(&format!("{e:#}"));
                return Err(e);
            }
        }
        Commands::Config(args) => config_cmd::run(&args, &config, &path).await?,
    }

    Ok(())
}
