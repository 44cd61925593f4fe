use url::Url;

use crate::{
    my_regex::{slug_separator_re, timestamp_re},
    types::{TranscriptLine, VideoId},
};

/// Query parameters that may carry the video identifier, by priority
const ID_QUERY_KEYS: [&str; 3] = ["id", "objectId", "contentID"];

/// Base used to make sense of relative links
const RELATIVE_BASE: &str = "http://localhost/";

const SLUG_MAX_LEN: usize = 80;
const SLUG_FALLBACK: &str = "transcript";

/// Extract the video identifier out of a video page link.
///
/// The query parameters are checked first, then the last path segment.
/// Anything that does not look like an identifier gives None, never an error.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(url)))
        .ok()?;

    for key in ID_QUERY_KEYS {
        // Only the first non-blank value of a key is considered
        let value = parsed
            .query_pairs()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v);

        if let Some(id) = value.as_deref().and_then(VideoId::parse) {
            return Some(id);
        }
    }

    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .and_then(VideoId::parse)
}

const LINE_BREAKS: &[char] = &['\n', '\r', '\u{0b}', '\u{0c}', '\u{85}', '\u{2028}', '\u{2029}'];

/// Turn the raw text of a transcript entry into a transcript line.
///
/// The rendered entry spreads over multiple lines: the caption, its timestamp
/// and sometimes the buttons of a load-failure widget. Lines equal to one of the
/// `noise_words` (ignoring case) are dropped, the last timestamp-looking line is
/// taken as the timestamp, and the rest is joined with spaces.
///
/// Return None when nothing is left to say.
pub fn clean_transcript_line<S: AsRef<str>>(
    raw_text: &str,
    noise_words: &[S],
) -> Option<TranscriptLine> {
    let mut pieces: Vec<&str> = raw_text
        .split(LINE_BREAKS)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .filter(|piece| {
            !noise_words
                .iter()
                .any(|noise| piece.eq_ignore_ascii_case(noise.as_ref()))
        })
        .collect();

    let timestamp = pieces
        .iter()
        .rposition(|piece| timestamp_re().is_match(piece))
        .map(|idx| pieces.remove(idx).to_owned());

    let text = pieces.join(" ");
    if text.is_empty() {
        return None;
    }

    Some(TranscriptLine { timestamp, text })
}

/// Make a file name friendly version of a title.
///
/// Every run of non-alphanumeric characters becomes a single hyphen.
pub fn slugify(title: &str) -> String {
    let slug = slug_separator_re().replace_all(title, "-");
    let mut slug = slug.trim_matches('-').to_owned();
    // Only ASCII is left so any byte index is a char boundary
    slug.truncate(SLUG_MAX_LEN);

    if slug.is_empty() {
        SLUG_FALLBACK.to_owned()
    } else {
        slug
    }
}
