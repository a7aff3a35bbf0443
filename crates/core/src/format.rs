use crate::types::{RunReport, TranscriptSegment};

/// Format seconds as M:SS, minutes unpadded
pub fn format_timestamp(seconds: f64) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One `[M:SS] text` line per segment, in transcript order
pub fn format_transcript_with_timestamps(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|seg| format!("[{}] {}", format_timestamp(seg.start), single_line(&seg.text)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_transcript_plain(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|seg| single_line(&seg.text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct NotesEntry {
    pub text: String,
    pub image: Option<NotesImage>,
}

pub struct NotesImage {
    pub file_name: String,
    pub caption: String,
}

/// Render exported notes as markdown; images are referenced relative to the
/// markdown file.
pub fn format_notes_markdown(report: &RunReport, source_url: &str, entries: &[NotesEntry]) -> String {
    let mut output = String::new();

    let title = report.title.as_deref().unwrap_or("Video notes");
    output.push_str(&format!("# {}\n\n", title));
    output.push_str(&format!("**Source:** {}\n\n", source_url));

    for entry in entries {
        if let Some(image) = &entry.image {
            output.push_str(&format!("![{}]({})\n\n", image.caption, image.file_name));
        }
        output.push_str(&entry.text);
        output.push('\n');
    }

    output
}
