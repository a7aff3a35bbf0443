use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt, process::Command};
use tracing::{info, warn};

use crate::{
    artifacts::{ArtifactKind, TempArtifact, discard},
    config::ToolPaths,
    error::{FrameNotesError, Result},
    player::{StreamFormat, fetch_player_response, http_client},
    video_id::extract_video_id,
};

fn download_failed(url: &str, reason: impl ToString) -> FrameNotesError {
    FrameNotesError::VideoDownloadFailed {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// One way of turning a URL into a playable local video file.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write the video to `dest`. A failed attempt may leave a partial file
    /// behind; the fetcher removes it.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Highest resolution progressive (audio + video) mp4 stream
pub fn pick_progressive_stream(formats: &[StreamFormat]) -> Option<&StreamFormat> {
    formats
        .iter()
        .filter(|f| f.url.is_some() && f.mime_type.starts_with("video/mp4"))
        .max_by_key(|f| f.height.unwrap_or(0))
}

/// Downloads the best progressive stream listed in the watch page player response.
pub struct ProgressiveStreamProvider {
    client: reqwest::Client,
}

impl ProgressiveStreamProvider {
    pub fn new() -> Result<Self> {
        let client = http_client().map_err(|e| download_failed("-", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VideoProvider for ProgressiveStreamProvider {
    fn name(&self) -> &'static str {
        "progressive"
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let video_id = extract_video_id(url)?;
        let player = fetch_player_response(&self.client, &video_id)
            .await
            .map_err(|e| download_failed(url, e))?;

        if let Some(reason) = player.unplayable_reason() {
            return Err(download_failed(url, reason));
        }

        let stream = pick_progressive_stream(player.progressive_formats())
            .ok_or_else(|| download_failed(url, "no progressive mp4 stream available"))?;
        let stream_url = stream.url.as_deref().unwrap_or_default();
        info!(
            quality = stream.quality_label.as_deref().unwrap_or("unknown"),
            "downloading progressive stream"
        );

        let mut response = self
            .client
            .get(stream_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_failed(url, e))?;

        let mut file = fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await.map_err(|e| download_failed(url, e))? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }
}

/// Fallback: shell out to yt-dlp with an explicit output file and format.
pub struct YtDlpProvider {
    program: PathBuf,
}

impl YtDlpProvider {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command_args(url: &str, dest: &Path) -> Vec<OsString> {
        vec![
            "-f".into(),
            "mp4".into(),
            "-o".into(),
            dest.as_os_str().to_owned(),
            url.into(),
        ]
    }
}

#[async_trait]
impl VideoProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(Self::command_args(url, dest))
            .output()
            .await
            .map_err(|e| download_failed(url, format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
            return Err(download_failed(
                url,
                format!("{} ({})", output.status, last_line.unwrap_or("no output")),
            ));
        }

        if !fs::try_exists(dest).await.unwrap_or(false) {
            return Err(download_failed(url, "yt-dlp reported success but wrote no file"));
        }

        Ok(())
    }
}

/// Tries each provider in order until one produces the video.
pub struct VideoFetcher {
    providers: Vec<Box<dyn VideoProvider>>,
}

impl VideoFetcher {
    pub fn new(providers: Vec<Box<dyn VideoProvider>>) -> Self {
        Self { providers }
    }

    /// Progressive stream first, yt-dlp second.
    pub fn youtube(tools: &ToolPaths) -> Result<Self> {
        Ok(Self::new(vec![
            Box::new(ProgressiveStreamProvider::new()?),
            Box::new(YtDlpProvider::new(&tools.yt_dlp)),
        ]))
    }

    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<TempArtifact> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            info!(provider = provider.name(), "downloading video");
            match provider.download(url, dest).await {
                Ok(()) => {
                    info!(provider = provider.name(), path = %dest.display(), "video downloaded");
                    return Ok(TempArtifact::new(ArtifactKind::Video, dest));
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "video provider failed");
                    discard(dest).await;
                    let reason = match e {
                        FrameNotesError::VideoDownloadFailed { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    failures.push(format!("{}: {}", provider.name(), reason));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no video providers configured".to_string());
        }
        Err(download_failed(url, failures.join("; ")))
    }
}
