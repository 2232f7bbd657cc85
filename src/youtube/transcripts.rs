use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::watch_url;

/// What a transcript provider knows about a video's subtitle languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptLookup {
    /// The provider could not be asked or gave no usable answer
    Unavailable,

    /// Language codes the provider reported, possibly none
    Languages(Vec<String>),
}

/// Source of available transcript languages for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptCatalog: Send + Sync {
    async fn list_languages(&self, video_id: &str) -> TranscriptLookup;
}

fn has_prefix_ignore_case(code: &str, prefix: &str) -> bool {
    code.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Order transcript languages so Chinese, then English, variants come first.
///
/// Returns `None` for an empty list.
pub fn choose_language_priority(codes: &[String]) -> Option<Vec<String>> {
    let mut unique: Vec<&str> = Vec::with_capacity(codes.len());
    for code in codes {
        if !unique.contains(&code.as_str()) {
            unique.push(code);
        }
    }

    let first = *unique.first()?;

    let chinese: Vec<&str> = unique
        .iter()
        .copied()
        .filter(|code| has_prefix_ignore_case(code, "zh"))
        .collect();
    let english: Vec<&str> = unique
        .iter()
        .copied()
        .filter(|code| has_prefix_ignore_case(code, "en"))
        .collect();

    let priority = if !chinese.is_empty() {
        chinese
    } else if !english.is_empty() {
        english
    } else {
        vec![first]
    };

    let mut ordered: Vec<String> = priority.iter().map(|code| code.to_string()).collect();
    ordered.extend(
        unique
            .iter()
            .filter(|code| !priority.contains(*code))
            .map(|code| code.to_string()),
    );

    Some(ordered)
}

/// Lists subtitle languages through `yt-dlp --dump-json`
pub struct YtDlpTranscriptCatalog {
    yt_dlp_path: String,
}

impl YtDlpTranscriptCatalog {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    async fn dump_video_info(&self, video_id: &str) -> anyhow::Result<Value> {
        let url = watch_url(video_id);
        tracing::debug!("Listing subtitle languages for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--skip-download", "--no-playlist", &url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let json_str = String::from_utf8(output.stdout)?;
        Ok(serde_json::from_str(&json_str)?)
    }
}

impl Default for YtDlpTranscriptCatalog {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Uploaded subtitle tracks first, then the original-language auto caption.
///
/// yt-dlp lists every machine translation under `automatic_captions`; only the
/// `-orig` entries describe a transcript that actually exists.
pub fn languages_from_video_info(info: &Value) -> Vec<String> {
    let mut languages = Vec::new();

    if let Some(subtitles) = info["subtitles"].as_object() {
        languages.extend(
            subtitles
                .keys()
                .filter(|code| code.as_str() != "live_chat")
                .cloned(),
        );
    }

    if let Some(captions) = info["automatic_captions"].as_object() {
        languages.extend(
            captions
                .keys()
                .filter_map(|code| code.strip_suffix("-orig"))
                .map(str::to_string),
        );
    }

    languages
}

#[async_trait]
impl TranscriptCatalog for YtDlpTranscriptCatalog {
    async fn list_languages(&self, video_id: &str) -> TranscriptLookup {
        match self.dump_video_info(video_id).await {
            Ok(info) => TranscriptLookup::Languages(languages_from_video_info(&info)),
            Err(e) => {
                tracing::warn!("Transcript languages unavailable for {}: {:#}", video_id, e);
                TranscriptLookup::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_prefers_chinese_then_english() {
        assert_eq!(
            choose_language_priority(&strings(&["en", "zh-Hans", "ja"])),
            Some(strings(&["zh-Hans", "en", "ja"]))
        );
        assert_eq!(
            choose_language_priority(&strings(&["fr", "en-US", "de"])),
            Some(strings(&["en-US", "fr", "de"]))
        );
    }

    #[test]
    fn test_keeps_order_without_known_prefix() {
        assert_eq!(
            choose_language_priority(&strings(&["fr", "de"])),
            Some(strings(&["fr", "de"]))
        );
    }

    #[test]
    fn test_empty_list_has_no_preference() {
        assert_eq!(choose_language_priority(&[]), None);
    }

    #[test]
    fn test_groups_all_variants_and_dedupes() {
        assert_eq!(
            choose_language_priority(&strings(&["en", "ZH-TW", "ja", "en", "zh-Hans", "ja"])),
            Some(strings(&["ZH-TW", "zh-Hans", "en", "ja"]))
        );
    }

    #[test]
    fn test_priority_is_stable_across_calls() {
        let codes = strings(&["de", "en-GB", "en", "de"]);
        let first = choose_language_priority(&codes);
        assert_eq!(first, choose_language_priority(&codes));
        assert_eq!(first, Some(strings(&["en-GB", "en", "de"])));
    }

    #[test]
    fn test_languages_from_video_info() {
        let info = serde_json::json!({
            "subtitles": { "live_chat": [], "en": [] },
            "automatic_captions": { "ja-orig": [], "ja": [], "fr": [] }
        });
        assert_eq!(languages_from_video_info(&info), strings(&["en", "ja"]));
        assert!(languages_from_video_info(&serde_json::json!({})).is_empty());
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let catalog = YtDlpTranscriptCatalog::new("/nonexistent/yt-dlp-binary");
        assert_eq!(
            catalog.list_languages("abc123").await,
            TranscriptLookup::Unavailable
        );
    }
}
