//! The watch page embeds a `ytInitialPlayerResponse` JSON blob with caption
//! tracks and progressive stream URLs. Both the transcript fetcher and the
//! primary video provider read it.

use serde::Deserialize;
use tracing::debug;

use crate::video_id::watch_url;

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub video_details: Option<VideoDetails>,
    #[serde(default)]
    pub captions: Option<Captions>,
    #[serde(default)]
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub length_seconds: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    pub player_captions_tracklist_renderer: CaptionTrackList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrackList {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated captions
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamingData {
    /// Progressive streams: audio and video muxed together
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFormat {
    #[serde(default)]
    pub url: Option<String>,
    pub mime_type: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub quality_label: Option<String>,
}

impl PlayerResponse {
    pub fn title(&self) -> Option<String> {
        self.video_details.as_ref().and_then(|d| d.title.clone())
    }

    pub fn caption_tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .map(|c| c.player_captions_tracklist_renderer.caption_tracks.as_slice())
            .unwrap_or_default()
    }

    pub fn progressive_formats(&self) -> &[StreamFormat] {
        self.streaming_data
            .as_ref()
            .map(|s| s.formats.as_slice())
            .unwrap_or_default()
    }

    pub fn unplayable_reason(&self) -> Option<String> {
        let status = self.playability_status.as_ref()?;
        if status.status == "OK" {
            return None;
        }
        Some(
            status
                .reason
                .clone()
                .unwrap_or_else(|| status.status.clone()),
        )
    }
}

/// Pull the player response out of watch page HTML. Only the first complete
/// JSON value after the marker is parsed; trailing script is ignored.
pub fn parse_player_response(html: &str) -> Option<PlayerResponse> {
    let start = html.find(PLAYER_RESPONSE_MARKER)? + PLAYER_RESPONSE_MARKER.len();
    serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<PlayerResponse>()
        .next()?
        .ok()
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("player response not found in watch page")]
    Missing,
}

pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

pub async fn fetch_player_response(
    client: &reqwest::Client,
    video_id: &str,
) -> Result<PlayerResponse, PlayerError> {
    let url = watch_url(video_id);
    debug!(%url, "fetching watch page");

    let html = client
        .get(&url)
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_player_response(&html).ok_or(PlayerError::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><script>var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"},"videoDetails":{"title":"Lecture 1","lengthSeconds":"600"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.com/tt?lang=de","languageCode":"de"},{"baseUrl":"https://example.com/tt?lang=en","languageCode":"en","kind":"asr"}]}},"streamingData":{"formats":[{"itag":18,"url":"https://example.com/360.mp4","mimeType":"video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"","height":360,"qualityLabel":"360p"}]}};var meta = document.createElement('meta');</script></html>"#;

    #[test]
    fn parses_embedded_player_response() {
        let player = parse_player_response(PAGE).unwrap();

        assert_eq!(player.title().as_deref(), Some("Lecture 1"));
        assert_eq!(player.unplayable_reason(), None);
        assert_eq!(player.caption_tracks().len(), 2);
        assert!(player.caption_tracks()[1].is_generated());
        assert_eq!(player.progressive_formats()[0].height, Some(360));
    }

    #[test]
    fn missing_marker_yields_none() {
        assert!(parse_player_response("<html>nothing here</html>").is_none());
    }

    #[test]
    fn unplayable_status_reports_reason() {
        let html = r#"ytInitialPlayerResponse = {"playabilityStatus":{"status":"LOGIN_REQUIRED","reason":"Sign in to confirm your age"}};"#;
        let player = parse_player_response(html).unwrap();

        assert_eq!(
            player.unplayable_reason().as_deref(),
            Some("Sign in to confirm your age")
        );
        assert!(player.caption_tracks().is_empty());
        assert!(player.progressive_formats().is_empty());
    }
}
