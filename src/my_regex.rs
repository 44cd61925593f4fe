use std::sync::OnceLock;

use regex::Regex;

/// A hexadecimal group of the given width
macro_rules! hex {
    ($n:literal) => {
        concat!("[0-9a-fA-F]{", $n, "}")
    };
}

/// Identifier shape: 8-4-4-4-12 hexadecimal groups, nothing around it.
/// Example: "3F2504E0-4F89-41D3-9A0C-0305E82C3301"
const VIDEO_ID_PATTERN: &str = concat!(
    "^",
    hex!(8),
    "-",
    hex!(4),
    "-",
    hex!(4),
    "-",
    hex!(4),
    "-",
    hex!(12),
    "$"
);

/// A transcript timestamp: `M:SS`, `MM:SS`, `H:MM:SS` or `HH:MM:SS`, nothing around it.
const TIMESTAMP_PATTERN: &str = r"^[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?$";

/// Anything that cannot appear in a file name slug
const SLUG_SEPARATOR_PATTERN: &str = r"[^A-Za-z0-9]+";

static VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();
static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();

pub fn video_id_re() -> &'static Regex {
    VIDEO_ID_RE.get_or_init(|| Regex::new(VIDEO_ID_PATTERN).unwrap())
}

pub fn timestamp_re() -> &'static Regex {
    TIMESTAMP_RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).unwrap())
}

pub fn slug_separator_re() -> &'static Regex {
    SLUG_SEPARATOR_RE.get_or_init(|| Regex::new(SLUG_SEPARATOR_PATTERN).unwrap())
}
