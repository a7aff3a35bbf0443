use url::Url;

use crate::error::{FrameNotesError, Result};

fn is_youtube_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "youtube.com" || host.ends_with(".youtube.com")
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extract the video identifier from a URL.
///
/// Accepted forms:
/// - any http(s) URL with a `v` query parameter (`watch?v=<id>&t=30` yields `<id>`)
/// - `youtu.be/<id>`
/// - `youtube.com/shorts/<id>`, `/embed/<id>`, `/live/<id>`
///
/// A pasted URL without a scheme (`www.youtube.com/watch?v=<id>`,
/// `youtu.be/<id>`) is read as https. Everything else is rejected with
/// `InvalidUrl`.
pub fn extract_video_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FrameNotesError::invalid_url(input, "empty URL"));
    }

    let url = match Url::parse(trimmed) {
        Err(url::ParseError::RelativeUrlWithoutBase) if !trimmed.contains("://") => {
            Url::parse(&format!("https://{trimmed}"))
        }
        parsed => parsed,
    }
    .map_err(|e| FrameNotesError::invalid_url(input, format!("not a URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FrameNotesError::invalid_url(
            input,
            format!("unsupported scheme {}", url.scheme()),
        ));
    }

    let id = if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        v.into_owned()
    } else {
        let host = url.host_str().unwrap_or_default();
        let mut segments = url.path_segments().into_iter().flatten();
        if host.eq_ignore_ascii_case("youtu.be") {
            segments.next().unwrap_or_default().to_string()
        } else if is_youtube_host(host) {
            match (segments.next(), segments.next()) {
                (Some("shorts" | "embed" | "live"), Some(id)) => id.to_string(),
                _ => {
                    return Err(FrameNotesError::invalid_url(
                        input,
                        "no video identifier in URL",
                    ));
                }
            }
        } else {
            return Err(FrameNotesError::invalid_url(input, "missing v= parameter"));
        }
    };

    if !is_valid_id(&id) {
        return Err(FrameNotesError::invalid_url(
            input,
            format!("malformed video identifier {id:?}"),
        ));
    }

    Ok(id)
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("http://img.youtube.com/vi/{}/0.jpg", video_id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_url_with_extra_parameters() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=30").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=abc_-1&index=2").unwrap(),
            "abc_-1"
        );
        assert_eq!(
            extract_video_id("www.youtube.com/watch?v=abc123&t=30").unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_video_id("youtube.com/watch?v=abc123").unwrap(),
            "abc123"
        );
        assert_eq!(extract_video_id("youtu.be/dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn query_parameter_wins_over_path() {
        assert_eq!(
            extract_video_id("https://youtu.be/watch?v=abc123").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn path_forms() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=xyz").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "",
            "   ",
            "dQw4w9WgXcQ",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?v=abc%20def",
            "https://example.com/video/123",
            "ftp://youtube.com/watch?v=abc",
        ] {
            let err = extract_video_id(bad).unwrap_err();
            assert!(
                matches!(err, FrameNotesError::InvalidUrl { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn thumbnail_points_at_first_frame_image() {
        assert_eq!(
            thumbnail_url("abc123"),
            "http://img.youtube.com/vi/abc123/0.jpg"
        );
    }
}
