use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::debug;

use crate::{
    artifacts::discard,
    config::ToolPaths,
    error::{FrameNotesError, Result},
};

#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Decode the frame at `offset_seconds` into `output`. On failure nothing
    /// is left at `output`.
    async fn extract(&self, video: &Path, offset_seconds: f64, output: &Path) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    #[serde(default)]
    streams: Vec<FFprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Parse an ffprobe rate such as "30/1" or "24000/1001"
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = match rate.split_once('/') {
        Some((num, den)) => (num.trim().parse::<f64>().ok()?, den.trim().parse::<f64>().ok()?),
        None => (rate.trim().parse::<f64>().ok()?, 1.0),
    };
    let fps = num / den;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Frame index (truncated) and the exact time of that frame.
pub fn frame_position(offset_seconds: f64, fps: f64) -> (u64, f64) {
    let index = (offset_seconds.max(0.0) * fps) as u64;
    (index, index as f64 / fps)
}

/// ffprobe for the frame rate, ffmpeg for a single decoded frame. Each call
/// opens and releases the video on its own.
pub struct FfmpegFrameExtractor {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegFrameExtractor {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
        }
    }

    async fn probe_frame_rate(&self, video: &Path) -> std::result::Result<f64, String> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=r_frame_rate,avg_frame_rate",
                "-of",
                "json",
            ])
            .arg(video)
            .output()
            .await
            .map_err(|e| format!("failed to run ffprobe: {e}"))?;

        if !output.status.success() {
            return Err(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let probe: FFprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("failed to parse ffprobe output: {e}"))?;

        probe
            .streams
            .first()
            .and_then(|s| {
                s.r_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .or_else(|| s.avg_frame_rate.as_deref().and_then(parse_frame_rate))
            })
            .ok_or_else(|| "video stream has no usable frame rate".to_string())
    }

    async fn decode_frame(
        &self,
        video: &Path,
        offset_seconds: f64,
        output: &Path,
    ) -> std::result::Result<(), String> {
        let fps = self.probe_frame_rate(video).await?;
        let (index, seek_seconds) = frame_position(offset_seconds, fps);
        debug!(offset_seconds, fps, index, "decoding frame");

        let result = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-y", "-ss"])
            .arg(format!("{seek_seconds:.6}"))
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(output)
            .output()
            .await
            .map_err(|e| format!("failed to run ffmpeg: {e}"))?;

        if !result.status.success() {
            return Err(format!(
                "ffmpeg failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            ));
        }

        // seeking past the end exits 0 without writing anything
        match fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(format!("no frame decoded at frame {index}")),
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract(&self, video: &Path, offset_seconds: f64, output: &Path) -> Result<()> {
        match self.decode_frame(video, offset_seconds, output).await {
            Ok(()) => Ok(()),
            Err(reason) => {
                discard(output).await;
                Err(FrameNotesError::FrameExtractionFailed {
                    video_path: video.to_path_buf(),
                    offset_seconds,
                    reason,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rational_frame_rates() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("garbage"), None);
    }

    #[test]
    fn frame_index_truncates() {
        assert_eq!(frame_position(10.0, 30.0), (300, 10.0));

        let (index, seek) = frame_position(10.0, 30000.0 / 1001.0);
        assert_eq!(index, 299);
        assert!(seek < 10.0 && seek > 9.97);

        assert_eq!(frame_position(0.0, 24.0), (0, 0.0));
    }

    #[tokio::test]
    async fn missing_tools_leave_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            yt_dlp: dir.path().join("missing-yt-dlp"),
            ffmpeg: dir.path().join("missing-ffmpeg"),
            ffprobe: dir.path().join("missing-ffprobe"),
        };
        let extractor = FfmpegFrameExtractor::new(&tools);
        let output = dir.path().join("frame_0_10.jpg");

        let err = extractor
            .extract(&dir.path().join("video.mp4"), 10.0, &output)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FrameNotesError::FrameExtractionFailed { offset_seconds, .. } if offset_seconds == 10.0
        ));
        assert!(!output.exists());
    }
}
