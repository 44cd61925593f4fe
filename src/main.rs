mod already_processed;
mod cli;
mod config;
mod io;
mod logging;
mod my_regex;
mod normalize;
mod outside;
mod result;
mod scraper;
mod types;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use tracing::{debug, info};

use crate::{
    already_processed::AlreadyProcessed,
    cli::Args,
    config::ScraperConfig,
    logging::init_logging,
    outside::{Chromedriver, WebDriver},
    scraper::{Outcome, Scraper},
};

fn main() -> Result<()> {
    // Initialize the environment & CLI
    let args = Args::parse();
    init_logging(args.log_level)?;

    let config = ScraperConfig::load(args.config.as_deref())?;
    debug!("Configuration: {config:?}");

    let output_dir = absolute(&args.output_dir)?;
    let state_file = args.state_file().map(absolute).transpose()?;

    if let Some(state_file) = state_file.as_deref().filter(|_| args.reset_state) {
        AlreadyProcessed::reset(state_file)?;
    }

    let processed = AlreadyProcessed::load(state_file.as_deref())?;
    let (known_ids, known_titles) = processed.counts();
    info!("{known_ids} videos already scraped ({known_titles} known titles)");

    let browser = open_browser(&args, &config)?;
    let timeout = Duration::from_secs(args.timeout_secs());

    let report = Scraper::new(browser, &config, &output_dir, timeout, processed)
        .run(&args.folder_url);

    match &report.outcome {
        Outcome::Aborted(reason) => info!("Run stopped early: {reason}"),
        outcome => debug!("Run ended with {outcome:?}"),
    }
    info!(
        "{} listed, {} skipped, {} scraped, {} failed",
        report.enumerated, report.skipped, report.scraped, report.failed
    );

    Ok(())
}

/// Connect to the given WebDriver server, or start our own
fn open_browser(args: &Args, config: &ScraperConfig) -> Result<WebDriver> {
    let headless = !args.no_headless;

    let (endpoint, driver) = match &args.webdriver_url {
        Some(url) => (url.clone(), None),
        None => {
            let driver = Chromedriver::launch(
                &args.chromedriver,
                config.driver_port,
                Duration::from_secs(config.driver_start_timeout_secs),
            )?;
            (driver.url().to_owned(), Some(driver))
        }
    };

    info!("Opening a browser session through {endpoint}");
    let browser = WebDriver::connect(&endpoint, headless, &config.window_size, driver)?;
    Ok(browser)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not resolve path {}", path.display()))
}
