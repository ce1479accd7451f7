//! `railfare fetch`: scrape a route and export its fare sheet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use logging::FareEventLogger;
use railfare_browser::{CdpDriver, CdpOptions};
use railfare_config::{BrowserConfig, RailfareConfig};
use railfare_core::{Connection, FareQuery};
use railfare_export::{CsvExporter, FareExporter};
use railfare_pipeline::{FareScraper, SessionController};
use tracing::info;

use crate::terminal_output::{fare_table, note_info, note_success};

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Departure station
    pub origin: String,

    /// Arrival station
    pub destination: String,

    /// Number of consecutive days, starting tomorrow
    #[arg(short, long, default_value_t = 7)]
    pub days: u32,

    /// Skip the inward leg
    #[arg(long)]
    pub one_way: bool,

    /// Output directory (overrides export.outputDir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Run the browser with a window
    #[arg(long)]
    pub headed: bool,
}

impl FetchArgs {
    fn query(&self) -> Result<FareQuery> {
        FareQuery::new(&self.origin, &self.destination, self.days, !self.one_way)
            .context("Invalid fare query")
    }

    /// Apply command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut RailfareConfig) {
        if self.headless {
            config.browser.headless = true;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(dir) = &self.output {
            config.export.output_dir = dir.clone();
        }
    }
}

pub async fn run(args: FetchArgs, mut config: RailfareConfig) -> Result<()> {
    args.apply(&mut config);
    let query = args.query()?;
    let scraper = FareScraper::from_config(&config).context("Invalid selector in config")?;

    let events = FareEventLogger::new();
    info!(
        query_id = events.query_id(),
        origin = %query.origin,
        destination = %query.destination,
        days = query.days,
        round_trip = query.round_trip,
        "Fetching fares"
    );
    note_info(&format!("Fetching {} day(s) {}", query.days, route(&query)));

    let driver = CdpDriver::connect(&cdp_options(&config.browser))
        .await
        .with_context(|| format!("Failed to open browser via {}", config.browser.devtools_url))?;
    let mut session = SessionController::new(driver);

    let connection = scraper
        .fetch_connection(&mut session, &query, &events)
        .await
        .with_context(|| format!("Fare query {} failed", route(&query)))?;

    let path = CsvExporter::new()
        .export(&connection, &config.export.output_dir)
        .context("Failed to export fares")?;

    print_connection(&connection);
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn route(query: &FareQuery) -> String {
    let arrow = if query.round_trip { "<->" } else { "->" };
    format!("{} {arrow} {}", query.origin, query.destination)
}

fn cdp_options(browser: &BrowserConfig) -> CdpOptions {
    CdpOptions {
        devtools_url: browser.devtools_url.clone(),
        executable: browser.executable.clone(),
        headless: browser.headless,
        window: (browser.window_width, browser.window_height),
        command_timeout: browser.command_timeout(),
        navigation_timeout: browser.navigation_timeout(),
        extensions: browser.extensions.clone(),
    }
}

fn print_connection(connection: &Connection) {
    println!("\n{} -> {}", connection.origin, connection.destination);
    print!("{}", fare_table(&connection.outward));
    if let Some(inward) = &connection.inward {
        println!("\n{} -> {}", connection.destination, connection.origin);
        print!("{}", fare_table(inward));
    }
}
