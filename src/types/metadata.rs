use std::fmt::Display;

use super::VideoId;

/// What the folder listing tells about a single video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub url: Option<String>,
    pub id: Option<VideoId>,
}

impl VideoMetadata {
    pub fn new(title: String, url: Option<String>) -> Self {
        let id = url.as_deref().and_then(crate::normalize::extract_video_id);
        Self { title, url, id }
    }

    /// The title to show in logs, never empty
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

impl Display for VideoMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", self.display_title())?;
        if let Some(id) = &self.id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}
