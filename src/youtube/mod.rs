use url::Url;

use crate::{ProcessingError, Result};

pub mod transcripts;

pub use transcripts::{
    choose_language_priority, TranscriptCatalog, TranscriptLookup, YtDlpTranscriptCatalog,
};

/// The URL shapes this service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoutubeUrlKind {
    /// `youtube.com/watch?v=<id>`
    Watch,
    /// `youtu.be/<id>`
    ShortLink,
    /// `youtube.com/embed/<id>`
    Embed,
    /// `youtube.com/v/<id>`
    Legacy,
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Path exactly as written, between the authority and any query or fragment
fn raw_path(url: &str) -> Option<&str> {
    let (_, rest) = url.trim().split_once("://")?;
    let start = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let rest = &rest[start..];
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Classify a URL, or `None` when it is not one of the supported shapes.
///
/// `Url` lowercases the host, so host matching is case-insensitive while the path is not.
pub fn classify(url: &str) -> Option<YoutubeUrlKind> {
    let parsed = Url::parse(url).ok()?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    if parsed.port().is_some() || !parsed.username().is_empty() || parsed.password().is_some() {
        return None;
    }

    let host = strip_www(parsed.host_str()?);
    let path = parsed.path();
    // `Url` normalizes dot segments and backslashes; only literal paths are accepted
    if raw_path(url) != Some(path) {
        return None;
    }

    match host {
        "youtu.be" => {
            let id = path.trim_start_matches('/');
            (!id.is_empty()).then_some(YoutubeUrlKind::ShortLink)
        }
        "youtube.com" => {
            if path == "/watch" {
                let has_id = parsed
                    .query_pairs()
                    .any(|(key, value)| key == "v" && !value.is_empty());
                return has_id.then_some(YoutubeUrlKind::Watch);
            }
            if let Some(rest) = path.strip_prefix("/embed/") {
                return (!rest.is_empty()).then_some(YoutubeUrlKind::Embed);
            }
            if let Some(rest) = path.strip_prefix("/v/") {
                return (!rest.is_empty()).then_some(YoutubeUrlKind::Legacy);
            }
            None
        }
        _ => None,
    }
}

/// Reject anything that is not a supported YouTube video URL
pub fn validate_video_url(url: &str) -> Result<YoutubeUrlKind> {
    classify(url).ok_or_else(|| ProcessingError::validation("Invalid YouTube URL."))
}

/// Best-effort video id extraction; never fails, only returns `None`
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = strip_www(parsed.host_str()?);

    match host {
        "youtu.be" => parsed
            .path_segments()?
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
        "youtube.com" => {
            if parsed.path() == "/watch" {
                return parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned())
                    .filter(|value| !value.is_empty());
            }
            let mut segments = parsed.path_segments()?;
            match segments.next() {
                Some("embed") | Some("v") => segments
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/watch?v={}",
        urlencoding::encode(video_id)
    )
}
