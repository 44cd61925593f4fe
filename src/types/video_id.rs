use std::fmt::Display;

use crate::my_regex::video_id_re;

/// Canonical identifier of a video on the portal.
///
/// Only strings shaped like a UUID are accepted, and they are stored lower-cased
/// so that two identifiers compare equal regardless of the portal casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a candidate identifier.
    /// Return None if it does not have the identifier shape.
    pub fn parse(candidate: &str) -> Option<Self> {
        if video_id_re().is_match(candidate) {
            Some(Self(candidate.to_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first 8 characters, used to disambiguate output file names
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
