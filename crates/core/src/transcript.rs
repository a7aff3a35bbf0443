use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use crate::{
    config::default_caption_languages,
    error::{FrameNotesError, Result},
    player::{CaptionTrack, fetch_player_response, http_client},
    types::{Transcript, TranscriptSegment},
};

static CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text start="([^"]+)"[^>]*>(.*?)</text>"#).expect("valid cue regex")
});

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Ordered caption segments for a video, or `TranscriptUnavailable`.
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}

/// Reads captions straight from YouTube: watch page → caption track → timed text.
pub struct YoutubeTranscriptSource {
    client: reqwest::Client,
    languages: Vec<String>,
}

impl YoutubeTranscriptSource {
    pub fn new(languages: Vec<String>) -> Result<Self> {
        let client = http_client().map_err(|e| FrameNotesError::transcript("-", e))?;
        let languages = if languages.is_empty() {
            default_caption_languages()
        } else {
            languages
        };
        Ok(Self { client, languages })
    }
}

/// Preferred languages in order, manual captions before auto-generated ones;
/// falls back to the first track.
pub fn pick_caption_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Option<&'a CaptionTrack> {
    let matches = |track: &CaptionTrack, lang: &str| {
        track.language_code == lang
            || track
                .language_code
                .split('-')
                .next()
                .is_some_and(|base| base == lang)
    };

    for lang in languages {
        let mut candidates = tracks.iter().filter(|t| matches(*t, lang));
        let manual = tracks
            .iter()
            .find(|t| matches(t, lang) && !t.is_generated());
        if let Some(track) = manual.or_else(|| candidates.next()) {
            return Some(track);
        }
    }

    tracks.iter().find(|t| !t.is_generated()).or(tracks.first())
}

/// Parse the timed-text XML body of a caption track.
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    CUE.captures_iter(xml)
        .filter_map(|cap| {
            let start: f64 = cap[1].parse().ok()?;
            // cue bodies are entity-encoded twice (`&amp;#39;`)
            let once = html_escape::decode_html_entities(&cap[2]).into_owned();
            let text = html_escape::decode_html_entities(&once);
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            Some(TranscriptSegment::new(start, text))
        })
        .filter(|seg| !seg.text.is_empty())
        .collect()
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let player = fetch_player_response(&self.client, video_id)
            .await
            .map_err(|e| FrameNotesError::transcript(video_id, e))?;

        let tracks = player.caption_tracks();
        if tracks.is_empty() {
            let reason = player
                .unplayable_reason()
                .unwrap_or_else(|| "captions are disabled or missing".to_string());
            return Err(FrameNotesError::transcript(video_id, reason));
        }

        let track = pick_caption_track(tracks, &self.languages)
            .ok_or_else(|| FrameNotesError::transcript(video_id, "no caption track"))?;
        debug!(
            language = %track.language_code,
            generated = track.is_generated(),
            "selected caption track"
        );

        let xml = self
            .client
            .get(&track.base_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FrameNotesError::transcript(video_id, e))?
            .text()
            .await
            .map_err(|e| FrameNotesError::transcript(video_id, e))?;

        let segments = parse_timed_text(&xml);
        if segments.is_empty() {
            return Err(FrameNotesError::transcript(
                video_id,
                "caption track is empty",
            ));
        }

        info!(video_id, segments = segments.len(), "transcript fetched");

        Ok(Transcript {
            video_id: video_id.to_string(),
            title: player.title(),
            language: Some(track.language_code.clone()),
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, generated: bool) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{lang}"),
            language_code: lang.to_string(),
            kind: generated.then(|| "asr".to_string()),
        }
    }

    #[test]
    fn parses_cues_and_decodes_entities() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0" dur="2.1">Intro</text><text start="65.32" dur="3">it&amp;#39;s a
topic &amp;amp; more</text><text start="70" dur="1"></text></transcript>"#;

        let segments = parse_timed_text(xml);

        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new(0.0, "Intro"),
                TranscriptSegment::new(65.32, "it's a topic & more"),
            ]
        );
    }

    #[test]
    fn prefers_manual_track_in_requested_language() {
        let tracks = vec![track("de", false), track("en", true), track("en-GB", false)];
        let picked = pick_caption_track(&tracks, &["en".to_string()]).unwrap();
        assert_eq!(picked.language_code, "en-GB");
    }

    #[test]
    fn falls_back_to_generated_track_in_language() {
        let tracks = vec![track("de", false), track("en", true)];
        let picked = pick_caption_track(&tracks, &["en".to_string()]).unwrap();
        assert_eq!(picked.language_code, "en");
        assert!(picked.is_generated());
    }

    #[test]
    fn falls_back_to_first_manual_track() {
        let tracks = vec![track("fr", true), track("de", false)];
        let picked = pick_caption_track(&tracks, &["en".to_string()]).unwrap();
        assert_eq!(picked.language_code, "de");

        assert!(pick_caption_track(&[], &["en".to_string()]).is_none());
    }
}
