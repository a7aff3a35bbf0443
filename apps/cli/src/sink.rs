use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as base64_engine};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use framenotes_core::{
    Frame, NoteLine, NotesEntry, NotesImage, NotesSink, Result, RunReport, RunStage,
    format_notes_markdown,
};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// How frames are drawn in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProtocol {
    /// iTerm2 inline images (`OSC 1337;File=`), also understood by WezTerm and VS Code
    Iterm2,
    /// Caption and size only
    Caption,
}

impl ImageProtocol {
    pub fn detect() -> Self {
        if !Term::stdout().is_term() {
            return Self::Caption;
        }
        Self::from_env(|var| std::env::var(var).ok())
    }

    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let program = lookup("TERM_PROGRAM").unwrap_or_default();
        let lc_terminal = lookup("LC_TERMINAL").unwrap_or_default();
        if matches!(program.as_str(), "iTerm.app" | "WezTerm" | "vscode") || lc_terminal == "iTerm2"
        {
            Self::Iterm2
        } else {
            Self::Caption
        }
    }
}

/// iTerm2 inline image escape sequence carrying `bytes`.
pub fn inline_image(name: &str, bytes: &[u8]) -> String {
    format!(
        "\x1b]1337;File=name={};size={};width=50%;preserveAspectRatio=1;inline=1:{}\x07",
        base64_engine.encode(name),
        bytes.len(),
        base64_engine.encode(bytes)
    )
}

/// Copies shown frames into a directory and writes `notes.md` next to them.
pub struct Exporter {
    dir: PathBuf,
    entries: Vec<NotesEntry>,
}

impl Exporter {
    pub async fn create(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            entries: Vec::new(),
        })
    }

    pub async fn add(&mut self, line: &NoteLine) -> Result<()> {
        let image = match &line.frame {
            Some(frame) => {
                let file_name = frame.timestamp.frame_file_name();
                fs::copy(&frame.path, self.dir.join(&file_name)).await?;
                Some(NotesImage {
                    file_name,
                    caption: frame.caption(),
                })
            }
            None => None,
        };

        self.entries.push(NotesEntry {
            text: line.text.clone(),
            image,
        });
        Ok(())
    }

    pub async fn finish(self, report: &RunReport, source_url: &str) -> Result<PathBuf> {
        let path = self.dir.join("notes.md");
        let markdown = format_notes_markdown(report, source_url, &self.entries);
        fs::write(&path, markdown).await?;
        Ok(path)
    }
}

/// Spinner per stage, then the notes printed line by line.
pub struct TerminalSink {
    provider_name: &'static str,
    images: ImageProtocol,
    spinner: Option<ProgressBar>,
    stage_started: Instant,
    exporter: Option<Exporter>,
}

impl TerminalSink {
    pub fn new(
        provider_name: &'static str,
        images: ImageProtocol,
        exporter: Option<Exporter>,
    ) -> Self {
        Self {
            provider_name,
            images,
            spinner: None,
            stage_started: Instant::now(),
            exporter,
        }
    }

    pub fn take_exporter(&mut self) -> Option<Exporter> {
        self.exporter.take()
    }

    fn finish_spinner(&mut self, ok: bool) {
        let Some(spinner) = self.spinner.take() else {
            return;
        };
        let elapsed = style(format!("[{}]", format_duration(self.stage_started.elapsed()))).dim();
        let msg = spinner.message();
        if ok {
            spinner.finish_with_message(format!(
                "{} {} {}",
                style("✓").green().bold(),
                msg.trim_end_matches("..."),
                elapsed
            ));
        } else {
            spinner.abandon_with_message(format!(
                "{} {} {}",
                style("✗").red().bold(),
                msg.trim_end_matches("..."),
                elapsed
            ));
        }
    }

    /// Read the frame while it still exists and render it for the terminal.
    async fn frame_block(&self, frame: &Frame) -> Result<String> {
        let bytes = fs::read(&frame.path).await?;
        let caption = format!(
            "{} {} {}",
            style("▣").cyan(),
            style(frame.caption()).cyan(),
            style(format!("({} KB)", (bytes.len() as u64).div_ceil(1024))).dim()
        );

        Ok(match self.images {
            ImageProtocol::Iterm2 => format!(
                "{}\n{}",
                inline_image(&frame.timestamp.frame_file_name(), &bytes),
                caption
            ),
            ImageProtocol::Caption => caption,
        })
    }

    fn start_spinner(&mut self, msg: &str) {
        self.stage_started = Instant::now();
        self.spinner = Some(create_spinner(msg));
    }
}

#[async_trait]
impl NotesSink for TerminalSink {
    fn on_stage(&mut self, stage: RunStage) {
        match stage {
            RunStage::Idle => {}
            RunStage::FetchingTranscript => self.start_spinner("Fetching transcript..."),
            RunStage::Summarizing => {
                self.finish_spinner(true);
                let msg = format!("Summarizing with {}...", self.provider_name);
                self.start_spinner(&msg);
            }
            RunStage::DownloadingVideo => {
                self.finish_spinner(true);
                self.start_spinner("Downloading video...");
            }
            RunStage::EmittingFrames => {
                self.finish_spinner(true);
                println!("{}", style("─".repeat(60)).dim());
            }
            RunStage::Cleanup | RunStage::Done => self.finish_spinner(true),
            RunStage::Failed => self.finish_spinner(false),
        }
    }

    async fn show(&mut self, line: &NoteLine) -> Result<()> {
        if let Some(frame) = &line.frame {
            println!("{}", self.frame_block(frame).await?);
        }
        println!("{}", line.text);

        if let Some(exporter) = self.exporter.as_mut() {
            exporter.add(line).await?;
        }
        Ok(())
    }
}

pub fn print_header(url: &str, thumbnail: Option<&str>) {
    println!(
        "\n{}  {}\n",
        style("framenotes").cyan().bold(),
        style("Video Notes").dim()
    );
    println!("{} {}", style("Video:").dim(), url);
    if let Some(thumbnail) = thumbnail {
        println!("{} {}", style("Thumbnail:").dim(), style(thumbnail).cyan());
    }
    println!("{}", style("─".repeat(60)).dim());
}

pub fn print_saved(path: &Path) {
    println!("\n{} {}\n", style("Saved:").dim(), style(path.display()).cyan());
}

#[cfg(test)]
mod tests {
    use framenotes_core::Timestamp;

    use super::*;

    #[test]
    fn durations_switch_to_minutes() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn inline_images_only_on_capable_terminals() {
        let env = |pairs: &'static [(&'static str, &'static str)]| {
            move |var: &str| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == var)
                    .map(|(_, v)| v.to_string())
            }
        };

        assert_eq!(
            ImageProtocol::from_env(env(&[("TERM_PROGRAM", "iTerm.app")])),
            ImageProtocol::Iterm2
        );
        assert_eq!(
            ImageProtocol::from_env(env(&[("LC_TERMINAL", "iTerm2")])),
            ImageProtocol::Iterm2
        );
        assert_eq!(
            ImageProtocol::from_env(env(&[("TERM_PROGRAM", "Apple_Terminal")])),
            ImageProtocol::Caption
        );
        assert_eq!(ImageProtocol::from_env(env(&[])), ImageProtocol::Caption);
    }

    #[tokio::test]
    async fn frame_is_rendered_from_its_bytes_before_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_1_30.jpg");
        std::fs::write(&path, b"\xff\xd8jpeg bytes").unwrap();
        let frame = Frame {
            timestamp: Timestamp::new(1, 30),
            path: path.clone(),
        };

        let sink = TerminalSink::new("Gemini", ImageProtocol::Iterm2, None);
        let block = sink.frame_block(&frame).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(block.contains("\x1b]1337;File="));
        assert!(block.contains(&base64_engine.encode(b"\xff\xd8jpeg bytes")));
        assert!(block.contains("Key concept at [1:30]"));

        let plain = TerminalSink::new("Gemini", ImageProtocol::Caption, None);
        assert!(plain.frame_block(&frame).await.is_err());
    }

    #[tokio::test]
    async fn caption_fallback_has_no_escape_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_0_10.jpg");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let frame = Frame {
            timestamp: Timestamp::new(0, 10),
            path,
        };

        let sink = TerminalSink::new("Gemini", ImageProtocol::Caption, None);
        let block = sink.frame_block(&frame).await.unwrap();

        assert!(!block.contains("1337"));
        assert!(block.contains("Key concept at [0:10]"));
        assert!(block.contains("(2 KB)"));
    }

    #[tokio::test]
    async fn exporter_copies_frames_and_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let frame_path = dir.path().join("tmp_frame.jpg");
        std::fs::write(&frame_path, b"jpeg").unwrap();

        let mut exporter = Exporter::create(dir.path().join("out")).await.unwrap();
        exporter
            .add(&NoteLine {
                index: 0,
                text: "- Concept [1:30]".into(),
                frame: Some(Frame {
                    timestamp: Timestamp::new(1, 30),
                    path: frame_path.clone(),
                }),
            })
            .await
            .unwrap();
        exporter
            .add(&NoteLine {
                index: 1,
                text: "- Plain".into(),
                frame: None,
            })
            .await
            .unwrap();

        let report = RunReport {
            video_id: "abc123".into(),
            title: None,
            summary: String::new(),
            lines: 2,
            frames_shown: 1,
            frames_missing: 0,
        };
        let notes = exporter
            .finish(&report, "https://youtu.be/abc123")
            .await
            .unwrap();

        let markdown = std::fs::read_to_string(&notes).unwrap();
        assert!(markdown.contains("![Key concept at [1:30]](frame_1_30.jpg)"));
        assert!(markdown.contains("- Plain"));
        assert_eq!(
            std::fs::read(dir.path().join("out").join("frame_1_30.jpg")).unwrap(),
            b"jpeg"
        );
    }
}
