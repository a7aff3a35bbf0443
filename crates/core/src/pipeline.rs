//! The alignment pipeline: transcript → summary → video → one frame per
//! distinct timestamp, shown next to its summary line.

use std::path::Path;

use async_trait::async_trait;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    artifacts::{ArtifactKind, TempArtifact, Workspace, discard},
    error::{FrameNotesError, Result},
    frames::FrameExtractor,
    summarizer::{PromptStyle, Summarizer},
    timestamps::{Timestamp, plan_lines},
    transcript::TranscriptSource,
    types::{Frame, NoteLine, RunReport, Transcript},
    video::VideoFetcher,
    video_id::extract_video_id,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    FetchingTranscript,
    Summarizing,
    DownloadingVideo,
    EmittingFrames,
    Cleanup,
    Done,
    Failed,
}

/// The presentation layer. Frame files handed to `show` are deleted as soon
/// as it returns.
#[async_trait]
pub trait NotesSink: Send {
    fn on_stage(&mut self, _stage: RunStage) {}

    async fn show(&mut self, line: &NoteLine) -> Result<()>;
}

pub struct AlignmentPipeline {
    transcripts: Box<dyn TranscriptSource>,
    summarizer: Summarizer,
    videos: VideoFetcher,
    frames: Box<dyn FrameExtractor>,
    workspace: Workspace,
}

impl AlignmentPipeline {
    pub fn new(
        transcripts: Box<dyn TranscriptSource>,
        summarizer: Summarizer,
        videos: VideoFetcher,
        frames: Box<dyn FrameExtractor>,
        workspace: Workspace,
    ) -> Self {
        Self {
            transcripts,
            summarizer,
            videos,
            frames,
            workspace,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Full run with frames. Artifacts are removed on every exit path.
    pub async fn run(&self, url: &str, sink: &mut dyn NotesSink) -> Result<RunReport> {
        let span = info_span!("run", run_id = %Uuid::new_v4());
        let result = self.run_stages(url, sink).instrument(span).await;
        finish(&result, sink);
        result
    }

    /// Text-only run: transcript and a brief summary, no video.
    pub async fn summarize_only(&self, url: &str, sink: &mut dyn NotesSink) -> Result<String> {
        let span = info_span!("summary", run_id = %Uuid::new_v4());
        let result = async {
            let transcript = self.fetch_transcript(url, sink).await?;
            sink.on_stage(RunStage::Summarizing);
            self.summarizer
                .summarize(PromptStyle::Brief, &transcript.segments)
                .await
        }
        .instrument(span)
        .await;
        finish(&result, sink);
        result
    }

    async fn fetch_transcript(&self, url: &str, sink: &mut dyn NotesSink) -> Result<Transcript> {
        if url.trim().is_empty() {
            return Err(FrameNotesError::invalid_url(url, "empty URL"));
        }
        sink.on_stage(RunStage::FetchingTranscript);
        let video_id = extract_video_id(url)?;
        self.transcripts.fetch(&video_id).await
    }

    async fn run_stages(&self, url: &str, sink: &mut dyn NotesSink) -> Result<RunReport> {
        let url = url.trim();
        let Transcript {
            video_id,
            title,
            segments,
            ..
        } = self.fetch_transcript(url, sink).await?;

        sink.on_stage(RunStage::Summarizing);
        let summary = self
            .summarizer
            .summarize(PromptStyle::Academic, &segments)
            .await?;
        drop(segments);

        sink.on_stage(RunStage::DownloadingVideo);
        self.workspace.ensure().await?;
        let video = self.videos.fetch(url, &self.workspace.video_path()).await?;

        sink.on_stage(RunStage::EmittingFrames);
        let plan = plan_lines(&summary);
        let mut frames_shown = 0;
        let mut frames_missing = 0;

        for (index, planned) in plan.iter().enumerate() {
            let frame = match planned.extract {
                Some(timestamp) => {
                    let artifact = self.extract_frame(video.path(), timestamp).await;
                    if artifact.is_some() {
                        frames_shown += 1;
                    } else {
                        frames_missing += 1;
                    }
                    artifact.map(|artifact| (timestamp, artifact))
                }
                None => None,
            };

            let line = NoteLine {
                index,
                text: planned.text.to_string(),
                frame: frame.as_ref().map(|(timestamp, artifact)| Frame {
                    timestamp: *timestamp,
                    path: artifact.path().to_path_buf(),
                }),
            };
            sink.show(&line).await?;

            if let Some((_, artifact)) = frame {
                if let Err(e) = artifact.remove().await {
                    warn!(error = %e, "failed to remove frame");
                }
            }
        }

        sink.on_stage(RunStage::Cleanup);
        if let Err(e) = video.remove().await {
            warn!(error = %e, "failed to remove video");
        }

        let lines = plan.len();
        drop(plan);
        info!(lines, frames_shown, frames_missing, "notes emitted");

        Ok(RunReport {
            video_id,
            title,
            lines,
            frames_shown,
            frames_missing,
            summary,
        })
    }

    /// `None` when the frame could not be decoded; the line is then shown
    /// without an image.
    async fn extract_frame(&self, video: &Path, timestamp: Timestamp) -> Option<TempArtifact> {
        let path = self.workspace.frame_path(&timestamp);
        match self
            .frames
            .extract(video, timestamp.offset_seconds(), &path)
            .await
        {
            Ok(()) => Some(TempArtifact::new(ArtifactKind::Frame, path)),
            Err(e) => {
                warn!(key = %timestamp.key(), error = %e, "frame unavailable");
                discard(&path).await;
                None
            }
        }
    }
}

fn finish<T>(result: &Result<T>, sink: &mut dyn NotesSink) {
    match result {
        Ok(_) => sink.on_stage(RunStage::Done),
        Err(e) => {
            warn!(error = %e, "run failed");
            sink.on_stage(RunStage::Failed);
        }
    }
}
