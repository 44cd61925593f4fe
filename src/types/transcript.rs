use std::fmt::Display;

/// A single spoken line of a transcript, with its optional timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub timestamp: Option<String>,
    pub text: String,
}

impl Display for TranscriptLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.timestamp {
            Some(timestamp) => write!(f, "{timestamp} {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}
