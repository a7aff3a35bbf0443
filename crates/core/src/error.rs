use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameNotesError {
    #[error("Invalid video URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Transcript unavailable for video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Video download failed for {url}: {reason}")]
    VideoDownloadFailed { url: String, reason: String },

    #[error("Frame extraction failed at {offset_seconds}s of {video_path}: {reason}")]
    FrameExtractionFailed {
        video_path: PathBuf,
        offset_seconds: f64,
        reason: String,
    },

    #[error("Summarization failed: {reason}")]
    SummarizationFailed { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    ConfigurationMissing { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FrameNotesError {
    pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transcript(video_id: &str, reason: impl ToString) -> Self {
        Self::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn summarization(reason: impl ToString) -> Self {
        Self::SummarizationFailed {
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameNotesError>;
