use std::{
    collections::HashSet,
    fmt::Display,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tracing::{debug, error, info, warn};

use crate::{
    already_processed::AlreadyProcessed,
    config::ScraperConfig,
    io::{build_output_path, write_transcript},
    normalize::{clean_transcript_line, slugify},
    outside::Browser,
    result::{bail, Error, Result},
    types::{TranscriptLine, VideoMetadata},
};

const UNTITLED_SESSION: &str = "Untitled Session";

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Every new video has been visited, successfully or not
    #[default]
    Completed,
    /// Every listed video had already been scraped
    UpToDate,
    /// The folder listing never showed up
    ListingTimedOut,
    /// The folder listing showed up but no video could be read from it
    NoVideos,
    /// Something unexpected stopped the run
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub outcome: Outcome,
    pub enumerated: usize,
    pub skipped: usize,
    pub scraped: usize,
    pub failed: usize,
}

/// Why a listed video is not scraped again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    KnownId,
    KnownTitle,
    NoUrl,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::KnownId => "already scraped by ID",
            SkipReason::KnownTitle => "already scraped by title",
            SkipReason::NoUrl => "no URL found",
        })
    }
}

/// Check whether a listed video has to be scraped
pub fn skip_reason(video: &VideoMetadata, processed: &AlreadyProcessed) -> Option<SkipReason> {
    if video.id.as_ref().is_some_and(|id| processed.contains_id(id)) {
        Some(SkipReason::KnownId)
    } else if processed.contains_title(video.display_title()) {
        Some(SkipReason::KnownTitle)
    } else if video.url.is_none() {
        Some(SkipReason::NoUrl)
    } else {
        None
    }
}

/// Keep the videos that were not scraped yet, in listing order
pub fn filter_new<'v>(
    videos: &'v [VideoMetadata],
    processed: &AlreadyProcessed,
) -> Vec<&'v VideoMetadata> {
    videos
        .iter()
        .filter(|video| match skip_reason(video, processed) {
            Some(reason) => {
                info!("Skipping '{}' ({reason})", video.display_title());
                false
            }
            None => true,
        })
        .collect()
}

/// Walks a folder of the portal and saves the transcripts of its new videos.
///
/// Everything is sequential: one page, one video at a time.
pub struct Scraper<'a, B: Browser> {
    browser: B,
    config: &'a ScraperConfig,
    out_dir: &'a Path,
    timeout: Duration,
    processed: AlreadyProcessed,
}

impl<'a, B: Browser> Scraper<'a, B> {
    pub fn new(
        browser: B,
        config: &'a ScraperConfig,
        out_dir: &'a Path,
        timeout: Duration,
        processed: AlreadyProcessed,
    ) -> Self {
        Self {
            browser,
            config,
            out_dir,
            timeout,
            processed,
        }
    }

    /// Scrape the folder, then close the browser whatever happened.
    ///
    /// Failures are logged and reported in the outcome, never returned.
    pub fn run(mut self, folder_url: &str) -> RunReport {
        let mut report = RunReport::default();

        report.outcome = match self.scrape_folder(folder_url, &mut report) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("An unexpected error occurred: {err}");
                self.save_screenshot(&self.config.listing_screenshot);
                Outcome::Aborted(err.to_string())
            }
        };

        if let Err(err) = self.browser.quit() {
            warn!("Could not close the browser cleanly: {err}");
        }

        report
    }

    fn scrape_folder(&mut self, folder_url: &str, report: &mut RunReport) -> Result<Outcome> {
        let selectors = &self.config.selectors;

        self.browser.navigate(folder_url)?;
        info!("Navigated to the course folder: {folder_url}");
        info!("Waiting for the list of videos to load...");

        let container =
            match self.wait_for_element(None, &selectors.video_container, "the video table") {
                Ok(container) => container,
                Err(err) if err.is_timeout() => return Ok(self.listing_timed_out(&err)),
                Err(err) => return Err(err),
            };

        let rows = match self.wait_for_elements(
            Some(&container),
            &selectors.video_row,
            "video rows inside the container",
        ) {
            Ok(rows) => rows,
            Err(err) if err.is_timeout() => return Ok(self.listing_timed_out(&err)),
            Err(err) => return Err(err),
        };
        info!("Found {} video rows; collecting metadata", rows.len());

        let videos = self.enumerate(&rows);
        report.enumerated = videos.len();
        if videos.is_empty() {
            warn!(
                "Could not extract any video metadata. \
                Check that the selectors still match the page"
            );
            self.save_screenshot(&self.config.listing_screenshot);
            return Ok(Outcome::NoVideos);
        }
        info!("Collected {} videos from the list", videos.len());

        let to_scrape = filter_new(&videos, &self.processed);
        report.skipped = videos.len() - to_scrape.len();
        if to_scrape.is_empty() {
            info!("No new videos to scrape. You're all caught up!");
            return Ok(Outcome::UpToDate);
        }
        info!("Need to scrape {} new video(s)", to_scrape.len());

        for video in to_scrape {
            let title = scrape_title(video);
            match self.scrape_video(video) {
                Ok(path) => {
                    info!("Transcript saved to {}", path.display());
                    report.scraped += 1;
                }
                Err(err) => {
                    if err.is_timeout() {
                        warn!("{err} on '{title}'");
                    } else {
                        error!("Could not scrape '{title}': {err}");
                    }
                    self.save_screenshot(&format!("error_{}.png", slugify(title)));
                    report.failed += 1;
                }
            }
        }

        info!("Finished scraping {} new video(s)", report.scraped);
        Ok(Outcome::Completed)
    }

    fn listing_timed_out(&self, err: &Error) -> Outcome {
        warn!("{err}");
        self.save_screenshot(&self.config.listing_screenshot);
        Outcome::ListingTimedOut
    }

    /// Read the metadata of every listed video.
    /// Rows that cannot be read, or that were already read, are left out.
    fn enumerate(&self, rows: &[B::Element]) -> Vec<VideoMetadata> {
        let mut seen_ids = HashSet::new();
        let mut videos = Vec::with_capacity(rows.len());

        for row in rows {
            let link = match self.browser.find(Some(row), &self.config.selectors.title_link) {
                Ok(Some(link)) => link,
                Ok(None) => {
                    debug!("Row without a video link, ignoring it");
                    continue;
                }
                Err(err) => {
                    debug!("Could not look for the video link of a row: {err}");
                    continue;
                }
            };

            let title = self.row_title(row, &link);
            let url = self
                .browser
                .property(&link, "href")
                .unwrap_or_else(|err| {
                    debug!("Could not read the link of '{title}': {err}");
                    None
                })
                .filter(|url| !url.is_empty());

            let video = VideoMetadata::new(title, url);
            if let Some(id) = &video.id {
                if !seen_ids.insert(id.clone()) {
                    debug!("{video} is listed more than once");
                    continue;
                }
            }

            debug!("Listed {video}");
            videos.push(video);
        }

        videos
    }

    /// The displayed title of a row, else the text of its link
    fn row_title(&self, row: &B::Element, link: &B::Element) -> String {
        let from_title_element = self
            .browser
            .find(Some(row), &self.config.selectors.title_text)
            .ok()
            .flatten()
            .and_then(|element| {
                self.first_text(&element, &[None, Some("innerText"), Some("textContent")])
            });

        from_title_element
            .or_else(|| self.first_text(link, &[None]))
            .unwrap_or_default()
    }

    /// Try the rendered text (None) and the given properties in order,
    /// returning the first one that is not blank, trimmed.
    fn first_text(&self, element: &B::Element, sources: &[Option<&str>]) -> Option<String> {
        sources.iter().find_map(|source| {
            let text = match source {
                None => self.browser.text(element).ok(),
                Some(name) => self.browser.property(element, name).ok().flatten(),
            }?;
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_owned())
        })
    }

    fn scrape_video(&mut self, video: &VideoMetadata) -> Result<PathBuf> {
        let title = scrape_title(video);
        let Some(url) = video.url.as_deref() else {
            return bail(format!("No URL for '{title}'"));
        };
        let selectors = &self.config.selectors;

        info!("Opening video page for '{title}'");
        self.browser.navigate(url)?;

        self.wait_for_element(None, &selectors.transcript_container, "the transcript")?;
        let elements =
            self.wait_for_elements(None, &selectors.transcript_line, "the transcript lines")?;
        info!("Found {} transcript lines for '{title}'", elements.len());

        let mut lines: Vec<TranscriptLine> = Vec::with_capacity(elements.len());
        for element in &elements {
            let raw_text = match self.raw_line_text(element) {
                Ok(raw_text) => raw_text,
                Err(err) => {
                    debug!("Could not read a transcript line of '{title}': {err}");
                    continue;
                }
            };
            if let Some(line) = clean_transcript_line(&raw_text, &self.config.noise_words) {
                lines.push(line);
            }
        }
        info!("Using {} formatted transcript lines", lines.len());

        let path = build_output_path(self.out_dir, Some(title), video.id.as_ref())?;
        write_transcript(&path, &lines)?;
        self.processed.push(video.id.as_ref(), title)?;

        Ok(path)
    }

    /// The text of a transcript entry, line breaks included
    fn raw_line_text(&self, element: &B::Element) -> Result<String> {
        if let Some(text) = self
            .browser
            .property(element, "innerText")?
            .filter(|t| !t.is_empty())
        {
            return Ok(text);
        }

        let text = self.browser.text(element)?;
        if !text.is_empty() {
            return Ok(text);
        }

        Ok(self
            .browser
            .property(element, "textContent")?
            .unwrap_or_default())
    }

    /// Poll the condition until it gives something or the timeout elapses
    fn wait_until<T, F>(&self, what: &str, mut condition: F) -> Result<T>
    where
        F: FnMut() -> Result<Option<T>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(value) = condition()? {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout(what));
            }
            std::thread::sleep(self.config.poll_interval());
        }
    }

    fn wait_for_element(
        &self,
        scope: Option<&B::Element>,
        selector: &str,
        what: &str,
    ) -> Result<B::Element> {
        self.wait_until(what, || self.browser.find(scope, selector))
    }

    fn wait_for_elements(
        &self,
        scope: Option<&B::Element>,
        selector: &str,
        what: &str,
    ) -> Result<Vec<B::Element>> {
        self.wait_until(what, || {
            let elements = self.browser.find_all(scope, selector)?;
            Ok((!elements.is_empty()).then_some(elements))
        })
    }

    /// Best effort capture of the page, to understand a failure afterwards
    fn save_screenshot(&self, name: &str) {
        let path = self.config.screenshot_dir.join(name);
        match self.browser.screenshot(&path) {
            Ok(()) => info!("Saved a screenshot to {}", path.display()),
            Err(err) => warn!("Could not save a screenshot to {}: {err}", path.display()),
        }
    }
}

/// Title used for files and state entries
fn scrape_title(video: &VideoMetadata) -> &str {
    if video.title.is_empty() {
        UNTITLED_SESSION
    } else {
        &video.title
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use super::*;
    use crate::{config::Selectors, types::VideoId};

    const ID_1: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";
    const ID_2: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
    const FOLDER: &str = "https://portal.example.edu/Panopto/Pages/Sessions/List.aspx#folderID=x";

    fn viewer_url(id: &str) -> String {
        format!("https://portal.example.edu/Panopto/Pages/Viewer.aspx?id={id}")
    }

    #[derive(Debug, Default)]
    struct Node {
        selector: String,
        parent: Option<usize>,
        text: String,
        properties: HashMap<String, String>,
        stale: bool,
    }

    #[derive(Debug, Default)]
    struct FakePage {
        nodes: Vec<Node>,
    }

    impl FakePage {
        fn add(
            &mut self,
            parent: Option<usize>,
            selector: &str,
            text: &str,
            properties: &[(&str, &str)],
        ) -> usize {
            self.nodes.push(Node {
                selector: selector.to_owned(),
                parent,
                text: text.to_owned(),
                properties: properties
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            });
            self.nodes.len() - 1
        }

        fn folder(videos: &[(&str, &str)]) -> Self {
            let selectors = Selectors::default();
            let mut page = Self::default();
            let container = page.add(None, &selectors.video_container, "", &[]);
            for (title, url) in videos {
                let row = page.add(Some(container), &selectors.video_row, "", &[]);
                page.add(Some(row), &selectors.title_text, title, &[]);
                page.add(Some(row), &selectors.title_link, title, &[("href", url)]);
            }
            page
        }

        fn video(lines: &[&str]) -> Self {
            let selectors = Selectors::default();
            let mut page = Self::default();
            let pane = page.add(None, &selectors.transcript_container, "", &[]);
            for line in lines {
                page.add(Some(pane), &selectors.transcript_line, "", &[("innerText", line)]);
            }
            page
        }
    }

    #[derive(Debug, Default)]
    struct FakeState {
        visited: Vec<String>,
        current: Option<String>,
        screenshots: Vec<PathBuf>,
        quit: bool,
    }

    /// An in-memory browser serving scripted pages
    struct FakeBrowser {
        pages: HashMap<String, FakePage>,
        state: Rc<RefCell<FakeState>>,
    }

    impl FakeBrowser {
        fn new(pages: Vec<(String, FakePage)>) -> (Self, Rc<RefCell<FakeState>>) {
            let state = Rc::new(RefCell::new(FakeState::default()));
            let browser = Self {
                pages: pages.into_iter().collect(),
                state: state.clone(),
            };
            (browser, state)
        }

        fn node(&self, idx: usize) -> Result<&Node> {
            let state = self.state.borrow();
            let Some(page) = state.current.as_ref().and_then(|url| self.pages.get(url)) else {
                return bail("No page loaded");
            };
            match page.nodes.get(idx) {
                Some(node) if !node.stale => Ok(node),
                _ => bail("Stale element"),
            }
        }
    }

    impl Browser for FakeBrowser {
        type Element = usize;

        fn navigate(&self, url: &str) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.visited.push(url.to_owned());
            if !self.pages.contains_key(url) {
                return bail(format!("Connection refused for {url}"));
            }
            state.current = Some(url.to_owned());
            Ok(())
        }

        fn find_all(&self, scope: Option<&usize>, selector: &str) -> Result<Vec<usize>> {
            let state = self.state.borrow();
            let Some(page) = state.current.as_ref().and_then(|url| self.pages.get(url)) else {
                return bail("No page loaded");
            };
            Ok(page
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, node)| node.selector == selector)
                .filter(|(_, node)| scope.map_or(true, |scope| node.parent == Some(*scope)))
                .map(|(idx, _)| idx)
                .collect())
        }

        fn text(&self, element: &usize) -> Result<String> {
            Ok(self.node(*element)?.text.clone())
        }

        fn property(&self, element: &usize, name: &str) -> Result<Option<String>> {
            Ok(self.node(*element)?.properties.get(name).cloned())
        }

        fn screenshot(&self, path: &Path) -> Result<()> {
            self.state.borrow_mut().screenshots.push(path.to_path_buf());
            Ok(())
        }

        fn quit(self) -> Result<()> {
            self.state.borrow_mut().quit = true;
            Ok(())
        }
    }

    fn test_config(screenshot_dir: &Path) -> ScraperConfig {
        ScraperConfig {
            screenshot_dir: screenshot_dir.to_path_buf(),
            poll_interval_ms: 5,
            ..Default::default()
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(40);

    fn video(title: &str, url: Option<&str>) -> VideoMetadata {
        VideoMetadata::new(title.to_owned(), url.map(str::to_owned))
    }

    #[test]
    fn skip_reasons() {
        let mut processed = AlreadyProcessed::load(None).unwrap();
        processed
            .push(VideoId::parse(ID_1).as_ref(), "Lecture 1")
            .unwrap();
        processed.push(None, "(untitled)").unwrap();

        let by_id = video("Renamed lecture", Some(viewer_url(ID_1).as_str()));
        let by_title = video("Lecture 1", Some("https://portal.example.edu/other"));
        let untitled = video("", Some(viewer_url(ID_2).as_str()));
        let no_url = video("Lecture 9", None);
        let fresh = video("Lecture 2", Some(viewer_url(ID_2).as_str()));

        assert_eq!(skip_reason(&by_id, &processed), Some(SkipReason::KnownId));
        assert_eq!(skip_reason(&by_title, &processed), Some(SkipReason::KnownTitle));
        assert_eq!(skip_reason(&untitled, &processed), Some(SkipReason::KnownTitle));
        assert_eq!(skip_reason(&no_url, &processed), Some(SkipReason::NoUrl));
        assert_eq!(skip_reason(&fresh, &processed), None);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut processed = AlreadyProcessed::load(None).unwrap();
        processed.push(VideoId::parse(ID_1).as_ref(), "Lecture 1").unwrap();

        let videos = vec![
            video("Lecture 1", Some(viewer_url(ID_1).as_str())),
            video("Lecture 2", Some(viewer_url(ID_2).as_str())),
            video("Lecture 3", None),
        ];

        let first = filter_new(&videos, &processed);
        let second = filter_new(&videos, &processed);
        assert_eq!(first, second);
        assert_eq!(first, vec![&videos[1]]);
    }

    #[test]
    fn scrapes_only_unseen_videos() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("transcripts");
        let state_path = dir.path().join("data").join("state.txt");
        let config = test_config(dir.path());

        let mut processed = AlreadyProcessed::load(Some(&state_path)).unwrap();
        processed.push(VideoId::parse(ID_1).as_ref(), "Lecture 1").unwrap();

        let (browser, state) = FakeBrowser::new(vec![
            (
                FOLDER.to_owned(),
                FakePage::folder(&[
                    ("Lecture 1", viewer_url(ID_1).as_str()),
                    ("Lecture 2: Limits", viewer_url(&ID_2.to_uppercase()).as_str()),
                ]),
            ),
            (viewer_url(ID_1), FakePage::video(&["0:01\nAlready seen"])),
            (
                viewer_url(&ID_2.to_uppercase()),
                FakePage::video(&["Retry\n0:05\nWelcome back", "Cancel\nRetry", "Limits today"]),
            ),
        ]);

        let report = Scraper::new(browser, &config, &out_dir, TIMEOUT, processed).run(FOLDER);

        assert_eq!(
            report,
            RunReport {
                outcome: Outcome::Completed,
                enumerated: 2,
                skipped: 1,
                scraped: 1,
                failed: 0,
            }
        );

        let state = state.borrow();
        assert_eq!(
            state.visited,
            vec![FOLDER.to_owned(), viewer_url(&ID_2.to_uppercase())]
        );
        assert!(state.quit);
        assert!(state.screenshots.is_empty());

        let transcript = out_dir.join("Lecture-2-Limits-7c9e6679.txt");
        assert_eq!(
            std::fs::read_to_string(transcript).unwrap(),
            "0:05 Welcome back\nLimits today"
        );

        let entries = std::fs::read_to_string(&state_path).unwrap();
        let entries: Vec<_> = entries.lines().collect();
        assert_eq!(
            entries,
            vec![
                format!("{ID_1}|Lecture 1"),
                format!("{ID_2}|Lecture 2: Limits"),
            ]
        );
    }

    #[test]
    fn second_run_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("transcripts");
        let state_path = dir.path().join("state.txt");
        let config = test_config(dir.path());
        let pages = || {
            vec![
                (
                    FOLDER.to_owned(),
                    FakePage::folder(&[("Lecture 1", viewer_url(ID_1).as_str())]),
                ),
                (viewer_url(ID_1), FakePage::video(&["0:01\nHello"])),
            ]
        };

        let (browser, _) = FakeBrowser::new(pages());
        let processed = AlreadyProcessed::load(Some(&state_path)).unwrap();
        let report = Scraper::new(browser, &config, &out_dir, TIMEOUT, processed).run(FOLDER);
        assert_eq!(report.scraped, 1);

        let (browser, state) = FakeBrowser::new(pages());
        let processed = AlreadyProcessed::load(Some(&state_path)).unwrap();
        let report = Scraper::new(browser, &config, &out_dir, TIMEOUT, processed).run(FOLDER);
        assert_eq!(report.outcome, Outcome::UpToDate);
        assert_eq!(report.skipped, 1);
        assert_eq!(state.borrow().visited, vec![FOLDER.to_owned()]);
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[test]
    fn listing_timeout_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let (browser, state) = FakeBrowser::new(vec![(FOLDER.to_owned(), FakePage::default())]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert_eq!(report.outcome, Outcome::ListingTimedOut);
        let state = state.borrow();
        assert!(state.quit);
        assert_eq!(state.screenshots, vec![dir.path().join("error_screenshot.png")]);
    }

    #[test]
    fn empty_container_times_out_on_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let (browser, state) = FakeBrowser::new(vec![(FOLDER.to_owned(), FakePage::folder(&[]))]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert_eq!(report.outcome, Outcome::ListingTimedOut);
        assert_eq!(state.borrow().screenshots.len(), 1);
    }

    #[test]
    fn video_timeout_only_skips_that_video() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let state_path = dir.path().join("state.txt");
        let config = test_config(dir.path());

        let (browser, state) = FakeBrowser::new(vec![
            (
                FOLDER.to_owned(),
                FakePage::folder(&[
                    ("Broken lecture", viewer_url(ID_1).as_str()),
                    ("Good lecture", viewer_url(ID_2).as_str()),
                ]),
            ),
            (viewer_url(ID_1), FakePage::default()),
            (viewer_url(ID_2), FakePage::video(&["1:00\nFine"])),
        ]);
        let processed = AlreadyProcessed::load(Some(&state_path)).unwrap();

        let report = Scraper::new(browser, &config, &out_dir, TIMEOUT, processed).run(FOLDER);

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!((report.scraped, report.failed), (1, 1));
        assert_eq!(
            state.borrow().screenshots,
            vec![dir.path().join("error_Broken-lecture.png")]
        );

        let processed = AlreadyProcessed::load(Some(&state_path)).unwrap();
        assert!(!processed.contains_id(&VideoId::parse(ID_1).unwrap()));
        assert!(processed.contains_id(&VideoId::parse(ID_2).unwrap()));
    }

    #[test]
    fn unreadable_transcript_line_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut page = FakePage::video(&["0:01\nFirst", "0:02\nLost", "0:03\nThird"]);
        page.nodes[2].stale = true;

        let (browser, _) = FakeBrowser::new(vec![
            (
                FOLDER.to_owned(),
                FakePage::folder(&[("Lecture 1", viewer_url(ID_1).as_str())]),
            ),
            (viewer_url(ID_1), page),
        ]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert_eq!((report.scraped, report.failed), (1, 0));
        let transcript = dir.path().join("Lecture-1-0f8fad5b.txt");
        assert_eq!(
            std::fs::read_to_string(transcript).unwrap(),
            "0:01 First\n0:03 Third"
        );
    }

    #[test]
    fn unreachable_video_page_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let (browser, _) = FakeBrowser::new(vec![(
            FOLDER.to_owned(),
            FakePage::folder(&[("Gone", viewer_url(ID_1).as_str())]),
        )]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!((report.scraped, report.failed), (0, 1));
    }

    #[test]
    fn duplicate_rows_are_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let (browser, state) = FakeBrowser::new(vec![
            (
                FOLDER.to_owned(),
                FakePage::folder(&[
                    ("Lecture 1", viewer_url(ID_1).as_str()),
                    ("Lecture 1", viewer_url(&ID_1.to_uppercase()).as_str()),
                ]),
            ),
            (viewer_url(ID_1), FakePage::video(&["Hi"])),
        ]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert_eq!(report.enumerated, 1);
        assert_eq!(report.scraped, 1);
        assert_eq!(state.borrow().visited.len(), 2);
    }

    #[test]
    fn rows_without_link_mean_no_videos() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let selectors = Selectors::default();
        let mut page = FakePage::default();
        let container = page.add(None, &selectors.video_container, "", &[]);
        page.add(Some(container), &selectors.video_row, "Just text", &[]);

        let (browser, state) = FakeBrowser::new(vec![(FOLDER.to_owned(), page)]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert_eq!(report.outcome, Outcome::NoVideos);
        assert!(state.borrow().quit);
    }

    #[test]
    fn title_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let selectors = Selectors::default();
        let mut page = FakePage::default();
        let container = page.add(None, &selectors.video_container, "", &[]);

        // Hidden title element: only its properties have the text
        let row = page.add(Some(container), &selectors.video_row, "", &[]);
        page.add(Some(row), &selectors.title_text, "", &[("textContent", " Hidden ")]);
        let href = viewer_url(ID_1);
        page.add(Some(row), &selectors.title_link, "", &[("href", href.as_str())]);

        // No title element: the link text is used
        let row = page.add(Some(container), &selectors.video_row, "", &[]);
        let href = viewer_url(ID_2);
        page.add(Some(row), &selectors.title_link, " Link text ", &[("href", href.as_str())]);

        let (browser, _) = FakeBrowser::new(vec![(FOLDER.to_owned(), page)]);
        let processed = AlreadyProcessed::load(None).unwrap();
        let scraper = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed);

        scraper.browser.navigate(FOLDER).unwrap();
        let rows = scraper.browser.find_all(None, &selectors.video_row).unwrap();
        let videos = scraper.enumerate(&rows);
        let titles: Vec<_> = videos.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, ["Hidden", "Link text"]);
    }

    #[test]
    fn folder_navigation_failure_aborts_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let (browser, state) = FakeBrowser::new(vec![]);
        let processed = AlreadyProcessed::load(None).unwrap();

        let report = Scraper::new(browser, &config, dir.path(), TIMEOUT, processed).run(FOLDER);

        assert!(matches!(report.outcome, Outcome::Aborted(_)));
        let state = state.borrow();
        assert!(state.quit);
        assert_eq!(state.screenshots.len(), 1);
    }
}
