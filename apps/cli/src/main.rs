use std::{path::PathBuf, time::Instant};

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

use framenotes_core::{
    AlignmentPipeline, ChatCompletionsClient, FfmpegFrameExtractor, Provider, Summarizer,
    ToolPaths, VideoFetcher, Workspace, YoutubeTranscriptSource, extract_video_id,
    get_root_work_dir, thumbnail_url,
};

use crate::sink::{
    Exporter, ImageProtocol, TerminalSink, format_duration, print_header, print_saved,
};

mod sink;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "framenotes")]
#[command(about = "Turn YouTube videos into notes illustrated with the matching video frames")]
struct Cli {
    /// Video URL
    url: String,

    /// Print a brief text summary only; no video download, no frames
    #[arg(long)]
    text_only: bool,

    /// AI provider for summarization
    #[arg(short, long, default_value = "gemini")]
    provider: CliProvider,

    /// Model name, overriding the provider's default
    #[arg(short, long)]
    model: Option<String>,

    /// Caption languages in order of preference (e.g. "en,de")
    #[arg(short, long, value_delimiter = ',', default_value = "en")]
    lang: Vec<String>,

    /// Also write notes.md and the frame images into this directory
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Directory for the temporary video and frame files
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// yt-dlp executable used as the fallback downloader
    #[arg(long, default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "warn,framenotes=debug,framenotes_core=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let provider: Provider = cli.provider.into();

    // Resolve the API key once, before anything touches the network
    let generator_config = match provider.load_config(cli.model) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    let tools = ToolPaths {
        yt_dlp: cli.yt_dlp,
        ffmpeg: cli.ffmpeg,
        ffprobe: cli.ffprobe,
    };
    let workspace = Workspace::new(cli.work_dir.unwrap_or_else(get_root_work_dir));

    let leftovers = workspace.leftover_artifacts();
    if !leftovers.is_empty() {
        tracing::warn!(
            count = leftovers.len(),
            dir = %workspace.dir().display(),
            "workspace already holds artifacts; they will be overwritten"
        );
    }

    let pipeline = AlignmentPipeline::new(
        Box::new(YoutubeTranscriptSource::new(cli.lang)?),
        Summarizer::new(Box::new(ChatCompletionsClient::new(generator_config))),
        VideoFetcher::youtube(&tools)?,
        Box::new(FfmpegFrameExtractor::new(&tools)),
        workspace,
    );

    let url = cli.url.trim().to_string();
    let thumbnail = extract_video_id(&url).ok().map(|id| thumbnail_url(&id));
    print_header(&url, thumbnail.as_deref());

    let total_start = Instant::now();

    if cli.text_only {
        let mut sink = TerminalSink::new(provider.name(), ImageProtocol::Caption, None);
        let summary = match pipeline.summarize_only(&url, &mut sink).await {
            Ok(summary) => summary,
            Err(e) => fail(e),
        };
        println!("\n{}\n", style("Summary:").bold());
        println!("{}", summary);
    } else {
        let exporter = match cli.export {
            Some(dir) => Some(Exporter::create(dir).await?),
            None => None,
        };
        let mut sink = TerminalSink::new(provider.name(), ImageProtocol::detect(), exporter);

        let report = match pipeline.run(&url, &mut sink).await {
            Ok(report) => report,
            Err(e) => fail(e),
        };

        println!("{}", style("─".repeat(60)).dim());
        println!(
            "{} Notes generated: {} lines, {} frames{}",
            style("✓").green().bold(),
            report.lines,
            report.frames_shown,
            if report.frames_missing > 0 {
                format!(" ({} unavailable)", report.frames_missing)
            } else {
                String::new()
            }
        );

        if let Some(exporter) = sink.take_exporter() {
            let path = exporter.finish(&report, &url).await?;
            print_saved(&path);
        }
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    Ok(())
}
