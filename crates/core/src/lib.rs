//! Framenotes Core Library
//!
//! Turns a YouTube video into notes: fetches the transcript, summarizes it with
//! a generative model and pairs each timestamped concept with the matching
//! video frame.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod format;
pub mod frames;
pub mod pipeline;
pub mod player;
pub mod provider;
pub mod summarizer;
pub mod timestamps;
pub mod transcript;
pub mod types;
pub mod video;
pub mod video_id;

// Re-export commonly used items at crate root
pub use artifacts::{Workspace, get_root_work_dir};
pub use config::{ToolPaths, default_caption_languages};
pub use error::{FrameNotesError, Result};
pub use format::{
    NotesEntry, NotesImage, format_notes_markdown, format_timestamp,
    format_transcript_with_timestamps,
};
pub use frames::{FfmpegFrameExtractor, FrameExtractor};
pub use pipeline::{AlignmentPipeline, NotesSink, RunStage};
pub use provider::{GeneratorConfig, Provider, ProviderConfig};
pub use summarizer::{ChatCompletionsClient, PromptStyle, Summarizer, TextGenerator};
pub use timestamps::{Timestamp, TimestampKey};
pub use transcript::{TranscriptSource, YoutubeTranscriptSource};
pub use types::{Frame, NoteLine, RunReport, Transcript, TranscriptSegment};
pub use video::{VideoFetcher, VideoProvider, YtDlpProvider};
pub use video_id::{extract_video_id, thumbnail_url};
