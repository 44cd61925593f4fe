use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ::config::{Config, File, FileFormat};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

/// Where things are on the portal pages.
///
/// These are CSS selectors, matched against the rendered page.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Selectors {
    /// The folder list view
    pub video_container: String,
    /// One row of the folder list, looked up inside the container
    pub video_row: String,
    /// The link to the video page, inside a row
    pub title_link: String,
    /// The element holding the displayed title, inside a row
    pub title_text: String,
    /// The transcript pane of a video page
    pub transcript_container: String,
    /// One entry of the transcript pane
    pub transcript_line: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            video_container: "#listViewContainer".into(),
            video_row: "tbody tr.list-view-row".into(),
            title_link: ".item-title.title-link a.detail-title".into(),
            title_text: ".item-title.title-link span".into(),
            transcript_container: "div.event-tab-scroll-pane".into(),
            transcript_line: "li.index-event".into(),
        }
    }
}

/// Everything about the portal markup and the browser that is not given on the command line
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperConfig {
    pub selectors: Selectors,

    /// Transcript lines that are leftovers of the page widgets and not speech
    pub noise_words: Vec<String>,

    /// Directory where the screenshots of failures are saved
    pub screenshot_dir: PathBuf,
    /// File name of the screenshot taken when the folder listing fails
    pub listing_screenshot: String,

    /// How often to check the page while waiting for an element
    pub poll_interval_ms: u64,

    /// Browser window size, as `width,height`
    pub window_size: String,
    /// Port of the launched `chromedriver`
    pub driver_port: u16,
    /// How long the launched `chromedriver` has to become ready
    pub driver_start_timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            noise_words: vec!["retry".into(), "cancel".into()],
            screenshot_dir: PathBuf::from("."),
            listing_screenshot: "error_screenshot.png".into(),
            poll_interval_ms: 250,
            window_size: "1920,1080".into(),
            driver_port: 9515,
            driver_start_timeout_secs: 20,
        }
    }
}

impl ScraperConfig {
    /// Read the TOML configuration file, any missing key keeping its default value.
    /// Without a file, everything is default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not read configuration file {}", path.display()))?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid configuration")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
