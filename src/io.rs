use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};

use crate::{
    normalize::slugify,
    result::{bail, Result},
    types::{TranscriptLine, VideoId},
};

const UNTITLED: &str = "untitled-session";
const TRANSCRIPT_EXT: &str = "txt";

/// Create the parent directories of the path if needed
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Find where to write the transcript of a video, without ever reusing an existing file.
///
/// The directory is created if needed.
pub fn build_output_path(
    out_dir: &Path,
    title: Option<&str>,
    id: Option<&VideoId>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create output directory {}", out_dir.display()))?;

    let slug = slugify(title.filter(|t| !t.is_empty()).unwrap_or(UNTITLED));
    let base = match id {
        Some(id) => format!("{slug}-{}", id.short()),
        None => slug,
    };

    // Format for 1st file: <base>.txt
    let mut output = out_dir.join(format!("{base}.{TRANSCRIPT_EXT}"));
    if !output.exists() {
        return Ok(output);
    }

    // Format for the next ones: <base>-<n>.txt
    for n in 1u32.. {
        output.set_file_name(format!("{base}-{n}.{TRANSCRIPT_EXT}"));
        if !output.exists() {
            return Ok(output);
        }
    }

    bail("Code is broken or you have really REALLY too much transcripts with the same title")
}

/// Write the transcript lines, one per line, without trailing newline
pub fn write_transcript(path: &Path, lines: &[TranscriptLine]) -> Result<()> {
    let content = lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    std::fs::write(path, content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not write transcript {}", path.display()))?;
    Ok(())
}
