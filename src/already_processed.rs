use std::{
    collections::BTreeSet,
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use miette::{Context, IntoDiagnostic};
use tracing::{debug, info};

use crate::{io::ensure_parent_dir, result::Result, types::VideoId};

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// The videos already scraped in previous runs, known by identifier or by title.
///
/// Each entry of the backing file is one of `<id>|<title>`, `<id>` or `<title>`.
/// The file is only ever appended to, so a crash loses at most the entry being written.
#[derive(Debug, Default)]
pub struct AlreadyProcessed {
    ids: BTreeSet<VideoId>,
    titles: BTreeSet<String>,
    path: Option<PathBuf>,
}

impl AlreadyProcessed {
    /// Read the entries of the state file.
    ///
    /// Without a path, nothing is ever persisted.
    /// A missing file is the same as an empty one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut this = Self {
            path: path.map(Path::to_path_buf),
            ..Default::default()
        };

        let Some(path) = path else {
            return Ok(this);
        };
        if !path.exists() {
            debug!("No state file at {}", path.display());
            return Ok(this);
        }

        let file = File::open(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not open state file {}", path.display()))?;

        for line in BufReader::new(file).lines() {
            let line = line
                .into_diagnostic()
                .wrap_err("Could not read state file line")?;
            this.read_entry(&line);
        }

        Ok(this)
    }

    fn read_entry(&mut self, line: &str) {
        let entry = line.trim();
        if entry.is_empty() {
            return;
        }

        let (head, title) = match entry.split_once('|') {
            Some((head, title)) => (head.trim(), Some(title.trim())),
            None => (entry, None),
        };

        match VideoId::parse(head) {
            Some(id) => {
                self.ids.insert(id);
                if let Some(title) = title.filter(|t| !t.is_empty()) {
                    self.titles.insert(title.to_owned());
                }
            }
            // Not an identifier: the whole line is a title, pipes included
            None => {
                self.titles.insert(entry.to_owned());
            }
        }
    }

    /// Remember a scraped video, in memory and then in the state file.
    pub fn push(&mut self, id: Option<&VideoId>, title: &str) -> Result<()> {
        let title = title.trim();

        if let Some(id) = id {
            self.ids.insert(id.clone());
        }
        if !title.is_empty() {
            self.titles.insert(title.to_owned());
        }

        let Some(path) = &self.path else {
            return Ok(());
        };

        ensure_parent_dir(path)?;
        let line = match (id, title.is_empty()) {
            (Some(id), false) => format!("{id}|{title}"),
            (Some(id), true) => id.as_str().to_owned(),
            (None, false) => title.to_owned(),
            (None, true) => return Ok(()),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not open state file {}", path.display()))?;

        write!(file, "{line}{LINE_ENDING}")
            .into_diagnostic()
            .wrap_err("Could not append to state file")?;
        Ok(())
    }

    /// Forget every previous run by deleting the state file.
    /// A missing file is fine.
    pub fn reset(path: &Path) -> Result<()> {
        if !path.exists() {
            debug!("No state file to remove at {}", path.display());
            return Ok(());
        }

        info!("Removing existing state file at {}", path.display());
        std::fs::remove_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not remove state file {}", path.display()))?;
        Ok(())
    }

    pub fn contains_id(&self, id: &VideoId) -> bool {
        self.ids.contains(id)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    /// Number of entries, counting identifiers and titles separately
    pub fn counts(&self) -> (usize, usize) {
        (self.ids.len(), self.titles.len())
    }
}
