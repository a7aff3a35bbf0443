use std::path::PathBuf;

use crate::timestamps::Timestamp;

/// One timestamped caption unit from a video's captions track.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, text: impl Into<String>) -> Self {
        Self {
            start: start.max(0.0),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub video_id: String,
    pub title: Option<String>,
    pub language: Option<String>,
    pub segments: Vec<TranscriptSegment>,
}

/// A frame image shown next to a summary line. The file at `path` only lives
/// until the sink returns.
#[derive(Debug, Clone)]
pub struct Frame {
    pub timestamp: Timestamp,
    pub path: PathBuf,
}

impl Frame {
    pub fn caption(&self) -> String {
        format!("Key concept at [{}]", self.timestamp.key())
    }
}

#[derive(Debug, Clone)]
pub struct NoteLine {
    pub index: usize,
    pub text: String,
    pub frame: Option<Frame>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub video_id: String,
    pub title: Option<String>,
    pub summary: String,
    pub lines: usize,
    pub frames_shown: usize,
    pub frames_missing: usize,
}
