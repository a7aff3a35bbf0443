use std::path::PathBuf;

pub const DEFAULT_CAPTION_LANGUAGES: &[&str] = &["en"];

/// External programs the pipeline shells out to.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

pub fn default_caption_languages() -> Vec<String> {
    DEFAULT_CAPTION_LANGUAGES
        .iter()
        .map(|lang| lang.to_string())
        .collect()
}
