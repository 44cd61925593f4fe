mod metadata;
mod transcript;
mod video_id;

pub use metadata::VideoMetadata;
pub use transcript::TranscriptLine;
pub use video_id::VideoId;
