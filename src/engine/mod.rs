use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

pub mod openai;
pub mod subtitles;

pub use openai::OpenAiEngine;

/// Errors reported by a processing engine
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Failed(String),
}

/// One processing call: where to write, which styles, which language
#[derive(Debug, Clone, Copy)]
pub struct ProcessingJob<'a> {
    pub video_url: &'a str,

    /// Directory the engine writes one file per style into
    pub output_dir: &'a Path,

    /// Engine-facing style names
    pub styles: &'a [String],

    pub output_language: &'a str,

    /// Transcript language order chosen for this request, if any
    pub transcript_languages: Option<&'a [String]>,
}

/// Something that turns a video into styled text files
#[async_trait]
pub trait ProcessingEngine: Send + Sync {
    /// Engine-facing style names currently supported
    async fn available_styles(&self) -> Result<HashSet<String>, EngineError>;

    /// Process a video, writing results into `job.output_dir`
    async fn process_youtube_url(&self, job: &ProcessingJob<'_>) -> Result<(), EngineError>;

    /// Engines that can honour a transcript language order expose it here
    fn language_preference(&self) -> Option<&dyn SupportsLanguagePreference> {
        None
    }
}

/// Optional engine capability: an ordered transcript language preference
pub trait SupportsLanguagePreference: Send + Sync {
    fn set_transcript_languages(&self, languages: Vec<String>);

    fn clear_transcript_languages(&self);

    fn transcript_languages(&self) -> Option<Vec<String>>;
}

/// Shared language slot engines can embed to implement [`SupportsLanguagePreference`].
///
/// Holds the most recent request's order when several requests share one engine;
/// [`ProcessingJob::transcript_languages`] carries the per-request value.
#[derive(Debug, Default)]
pub struct TranscriptConfig {
    transcript_languages: RwLock<Option<Vec<String>>>,
}

impl SupportsLanguagePreference for TranscriptConfig {
    fn set_transcript_languages(&self, languages: Vec<String>) {
        let mut slot = self
            .transcript_languages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(languages);
    }

    fn clear_transcript_languages(&self) {
        let mut slot = self
            .transcript_languages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }

    fn transcript_languages(&self) -> Option<Vec<String>> {
        self.transcript_languages
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_config_starts_unset() {
        let config = TranscriptConfig::default();
        assert_eq!(config.transcript_languages(), None);

        config.set_transcript_languages(vec!["zh".to_string(), "en".to_string()]);
        assert_eq!(
            config.transcript_languages(),
            Some(vec!["zh".to_string(), "en".to_string()])
        );

        config.clear_transcript_languages();
        assert_eq!(config.transcript_languages(), None);
    }
}
