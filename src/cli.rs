use std::path::{Path, PathBuf};

use clap::Parser;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("PSCRIBE_", $v)
    };
}

/// Download the transcripts of every lecture in a video portal folder.
///
/// Videos already downloaded in a previous run are remembered in a state file
/// and skipped, so the tool can simply be run again when new lectures are published.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// The URL of the folder to scrape.
    /// Open the course folder in list view and copy the address.
    #[arg(long, env=arg_env!("FOLDER_URL"))]
    pub folder_url: String,

    /// The directory where the transcript files are stored
    #[arg(long, default_value = "transcripts", env=arg_env!("OUTPUT_DIR"))]
    pub output_dir: PathBuf,

    /// The file tracking which videos have already been scraped.
    /// Set to an empty string to disable it.
    #[arg(long, default_value = "data/scraped_sessions.txt", env=arg_env!("STATE_FILE"))]
    pub state_file: String,

    /// Run the browser with a visible window (useful to log in the first time)
    #[arg(long, env=arg_env!("NO_HEADLESS"))]
    pub no_headless: bool,

    /// Seconds to wait for page elements before giving up
    #[arg(long, default_value_t = 30, allow_negative_numbers = true, env=arg_env!("TIMEOUT"))]
    pub timeout: i64,

    /// Delete the state file before scraping, so every lecture is downloaded again
    #[arg(long, env=arg_env!("RESET_STATE"))]
    pub reset_state: bool,

    /// A TOML file overriding the page selectors and other scraping settings
    #[arg(long, env=arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// The URL of an already running WebDriver server.
    /// If not given, `chromedriver` is started for the run.
    #[arg(long, env=arg_env!("WEBDRIVER_URL"))]
    pub webdriver_url: Option<String>,

    /// The `chromedriver` program to start when no WebDriver URL is given
    #[arg(long, default_value = crate::outside::CHROMEDRIVER, env=arg_env!("CHROMEDRIVER"))]
    pub chromedriver: String,

    /// The most verbose level of the logs to show
    #[arg(long, default_value_t = tracing::Level::INFO, env=arg_env!("LOG_LEVEL"))]
    pub log_level: tracing::Level,
}

impl Args {
    /// The state file to use, if persistence is enabled
    pub fn state_file(&self) -> Option<&Path> {
        (!self.state_file.is_empty()).then(|| Path::new(&self.state_file))
    }

    /// The wait timeout in seconds, never less than one
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.max(1).unsigned_abs()
    }
}
