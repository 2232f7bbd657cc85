use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

use crate::config::EngineConfig;
use crate::engine::{EngineError, OpenAiEngine, ProcessingEngine, ProcessingJob};
use crate::styles::{self, StyleResults};
use crate::utils::{round_seconds, utc_timestamp};
use crate::youtube::{
    self, choose_language_priority, TranscriptCatalog, TranscriptLookup, YtDlpTranscriptCatalog,
};
use crate::{ProcessingError, Result};

pub mod output;

/// Output language used when a request does not name one
pub const DEFAULT_OUTPUT_LANGUAGE: &str = "English";

/// Processed video with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub video_url: String,
    pub video_title: String,

    /// ISO-8601 UTC timestamp with a `Z` suffix
    pub processed_at: String,

    pub results: StyleResults,
    pub metadata: ProcessingMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Wall-clock seconds, two decimals
    pub processing_time: f64,

    pub language: String,

    /// Display names of the styles that were processed
    pub styles_processed: Vec<String>,
}

/// Runs a processing request from URL validation to the assembled result
pub struct VideoProcessingService {
    engine: Option<Arc<dyn ProcessingEngine>>,
    engine_config: EngineConfig,
    transcripts: Arc<dyn TranscriptCatalog>,
}

impl VideoProcessingService {
    pub fn new(
        engine: Option<Arc<dyn ProcessingEngine>>,
        engine_config: EngineConfig,
        transcripts: Arc<dyn TranscriptCatalog>,
    ) -> Self {
        Self {
            engine,
            engine_config,
            transcripts,
        }
    }

    /// Service with yt-dlp transcript lookup, building the engine per request
    pub fn from_config(engine_config: EngineConfig) -> Self {
        let transcripts = Arc::new(YtDlpTranscriptCatalog::new(engine_config.yt_dlp_path.clone()));
        Self::new(None, engine_config, transcripts)
    }

    /// Share one engine across all requests
    pub fn with_engine(mut self, engine: Arc<dyn ProcessingEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub async fn process_video(
        &self,
        video_url: &str,
        styles: Option<&[String]>,
        output_language: &str,
    ) -> Result<ProcessingResult> {
        let start_time = Instant::now();

        youtube::validate_video_url(video_url)?;
        if let Some(requested) = styles {
            styles::validate_display_names(requested)?;
        }

        let engine = self.engine()?;
        let transcript_languages = self
            .configure_transcript_languages(engine.as_ref(), video_url)
            .await?;
        let selected_styles = self.resolve_styles(styles, engine.as_ref()).await?;

        tracing::info!(
            "Processing {} with styles [{}] in {}",
            video_url,
            selected_styles.join(", "),
            output_language
        );

        let (results, video_title) = {
            let scratch = TempDir::new().map_err(|e| {
                ProcessingError::external(format!("Failed to create output directory: {}", e))
            })?;

            let job = ProcessingJob {
                video_url,
                output_dir: scratch.path(),
                styles: &selected_styles,
                output_language,
                transcript_languages: transcript_languages.as_deref(),
            };
            engine
                .process_youtube_url(&job)
                .await
                .map_err(|e| match e {
                    EngineError::Timeout(reason) => {
                        tracing::warn!("Engine timed out: {}", reason);
                        ProcessingError::Timeout("Video processing timed out.".to_string())
                    }
                    EngineError::Failed(reason) => ProcessingError::ExternalService(reason),
                })?;

            output::parse_outputs(scratch.path())?
        };

        if results.is_empty() {
            return Err(ProcessingError::external(
                "No processed results were returned.",
            ));
        }

        let styles_processed = styles::display_names_for(&selected_styles);
        let processing_time = round_seconds(start_time.elapsed().as_secs_f64());

        tracing::info!(
            "Processed {} in {:.2}s ({} results)",
            video_url,
            processing_time,
            results.len()
        );

        Ok(ProcessingResult {
            video_url: video_url.to_string(),
            video_title: if video_title.is_empty() {
                video_url.to_string()
            } else {
                video_title
            },
            processed_at: utc_timestamp(),
            results,
            metadata: ProcessingMetadata {
                processing_time,
                language: output_language.to_string(),
                styles_processed,
            },
        })
    }

    /// Injected engine, or a fresh one when a credential is configured
    fn engine(&self) -> Result<Arc<dyn ProcessingEngine>> {
        if let Some(engine) = &self.engine {
            return Ok(Arc::clone(engine));
        }
        if self.engine_config.api_key().is_none() {
            return Err(ProcessingError::Configuration(
                "OPENAI_API_KEY is not configured.".to_string(),
            ));
        }

        let engine = OpenAiEngine::new(&self.engine_config)
            .map_err(|e| ProcessingError::Configuration(format!("{:#}", e)))?;
        Ok(Arc::new(engine))
    }

    /// Pick the transcript language order for this request and mirror it into the engine.
    ///
    /// A provider that cannot answer leaves the preference unset; a provider that
    /// reports no subtitles at all fails the request.
    async fn configure_transcript_languages(
        &self,
        engine: &dyn ProcessingEngine,
        video_url: &str,
    ) -> Result<Option<Vec<String>>> {
        let preference = engine.language_preference();
        if let Some(preference) = preference {
            preference.clear_transcript_languages();
        }

        let Some(video_id) = youtube::extract_video_id(video_url) else {
            return Ok(None);
        };

        let languages = match self.transcripts.list_languages(&video_id).await {
            TranscriptLookup::Unavailable => return Ok(None),
            TranscriptLookup::Languages(languages) => languages,
        };

        let Some(priority) = choose_language_priority(&languages) else {
            return Err(ProcessingError::validation(
                "No subtitles found for this video.",
            ));
        };

        tracing::debug!("Transcript language priority: {}", priority.join(", "));
        match preference {
            Some(preference) => preference.set_transcript_languages(priority.clone()),
            None => tracing::debug!("Engine has no transcript language preference"),
        }

        Ok(Some(priority))
    }

    async fn resolve_styles(
        &self,
        requested: Option<&[String]>,
        engine: &dyn ProcessingEngine,
    ) -> Result<Vec<String>> {
        let available = engine.available_styles().await.map_err(|e| {
            tracing::warn!("Style query failed: {}", e);
            ProcessingError::external("Failed to retrieve available styles.")
        })?;

        styles::resolve_styles(requested, &available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SupportsLanguagePreference, TranscriptConfig};
    use crate::styles::STYLE_CATALOG;
    use crate::youtube::transcripts::MockTranscriptCatalog;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Writes `<title> - <style>.txt` for each requested style
    #[derive(Default)]
    struct FakeEngine {
        failure: Option<EngineError>,
        write_nothing: bool,
        styles_unavailable: bool,
        preference: Option<TranscriptConfig>,
        seen_dir: Mutex<Option<PathBuf>>,
        seen_styles: Mutex<Vec<String>>,
        /// Per call: languages on the job, then the engine's own preference slot
        seen_languages: Mutex<Vec<(Option<Vec<String>>, Option<Vec<String>>)>>,
    }

    #[async_trait]
    impl ProcessingEngine for FakeEngine {
        async fn available_styles(&self) -> std::result::Result<HashSet<String>, EngineError> {
            if self.styles_unavailable {
                return Err(EngineError::Failed("boom".to_string()));
            }
            Ok(STYLE_CATALOG
                .iter()
                .map(|entry| entry.engine_name.to_string())
                .collect())
        }

        async fn process_youtube_url(
            &self,
            job: &ProcessingJob<'_>,
        ) -> std::result::Result<(), EngineError> {
            *self.seen_dir.lock().unwrap() = Some(job.output_dir.to_path_buf());
            *self.seen_styles.lock().unwrap() = job.styles.to_vec();
            let slot = self
                .preference
                .as_ref()
                .and_then(|config| config.transcript_languages());
            self.seen_languages
                .lock()
                .unwrap()
                .push((job.transcript_languages.map(<[String]>::to_vec), slot));
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            if !self.write_nothing {
                for style in job.styles {
                    let path = job.output_dir.join(format!("Test_Video - {}.txt", style));
                    fs_err::write(path, format!("{} text\n", style)).unwrap();
                }
            }
            Ok(())
        }

        fn language_preference(&self) -> Option<&dyn SupportsLanguagePreference> {
            self.preference
                .as_ref()
                .map(|config| config as &dyn SupportsLanguagePreference)
        }
    }

    fn catalog_returning(lookup: TranscriptLookup) -> Arc<MockTranscriptCatalog> {
        let mut catalog = MockTranscriptCatalog::new();
        catalog
            .expect_list_languages()
            .returning(move |_| lookup.clone());
        Arc::new(catalog)
    }

    fn service(engine: Arc<FakeEngine>, lookup: TranscriptLookup) -> VideoProcessingService {
        VideoProcessingService::new(
            Some(engine),
            EngineConfig::default(),
            catalog_returning(lookup),
        )
    }

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    #[tokio::test]
    async fn test_processes_explicit_style() {
        let engine = Arc::new(FakeEngine::default());
        let service = service(engine.clone(), TranscriptLookup::Unavailable);

        let styles = vec!["Summary".to_string()];
        let result = service
            .process_video(URL, Some(&styles), "English")
            .await
            .unwrap();

        assert_eq!(result.results.summary.as_deref(), Some("Summary text"));
        assert_eq!(result.video_title, "Test Video");
        assert_eq!(result.metadata.language, "English");
        assert_eq!(result.metadata.styles_processed, styles);
        assert!(result.processed_at.ends_with('Z'));
        assert_eq!(*engine.seen_styles.lock().unwrap(), vec!["Summary".to_string()]);
    }

    #[tokio::test]
    async fn test_omitted_styles_resolve_to_catalog() {
        let engine = Arc::new(FakeEngine::default());
        let service = service(engine.clone(), TranscriptLookup::Unavailable);

        let result = service.process_video(URL, None, "English").await.unwrap();

        let display: Vec<String> = STYLE_CATALOG
            .iter()
            .map(|entry| entry.display_name.to_string())
            .collect();
        assert_eq!(result.metadata.styles_processed, display);
        assert_eq!(result.results.len(), 5);
        assert_eq!(
            result.results.qa_generation.as_deref(),
            Some("Q&A Generation text")
        );
    }

    #[tokio::test]
    async fn test_scratch_directory_is_removed() {
        let engine = Arc::new(FakeEngine::default());
        let healthy = service(engine.clone(), TranscriptLookup::Unavailable);
        healthy.process_video(URL, None, "English").await.unwrap();
        let dir = engine.seen_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists());

        let failing = Arc::new(FakeEngine {
            failure: Some(EngineError::Failed("engine exploded".to_string())),
            ..FakeEngine::default()
        });
        let broken = service(failing.clone(), TranscriptLookup::Unavailable);
        assert!(broken.process_video(URL, None, "English").await.is_err());
        let dir = failing.seen_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_language_priority_is_pushed_to_engine() {
        let engine = Arc::new(FakeEngine {
            preference: Some(TranscriptConfig::default()),
            ..FakeEngine::default()
        });
        let lookup = TranscriptLookup::Languages(vec![
            "en".to_string(),
            "zh".to_string(),
            "ja".to_string(),
        ]);
        let service = service(engine.clone(), lookup);

        service.process_video(URL, None, "Chinese").await.unwrap();

        let preference = engine.preference.as_ref().unwrap();
        assert_eq!(
            preference.transcript_languages(),
            Some(vec!["zh".to_string(), "en".to_string(), "ja".to_string()])
        );
    }

    #[tokio::test]
    async fn test_unavailable_lookup_does_not_inherit_previous_preference() {
        let engine = Arc::new(FakeEngine {
            preference: Some(TranscriptConfig::default()),
            ..FakeEngine::default()
        });

        let mut catalog = MockTranscriptCatalog::new();
        catalog
            .expect_list_languages()
            .withf(|video_id| video_id.to_string() == "first")
            .returning(|_| TranscriptLookup::Languages(vec!["zh".to_string()]));
        catalog
            .expect_list_languages()
            .withf(|video_id| video_id.to_string() == "second")
            .returning(|_| TranscriptLookup::Unavailable);

        let service = VideoProcessingService::new(
            Some(engine.clone()),
            EngineConfig::default(),
            Arc::new(catalog),
        );
        service
            .process_video("https://youtu.be/first", None, "Chinese")
            .await
            .unwrap();
        service
            .process_video("https://youtu.be/second", None, "English")
            .await
            .unwrap();

        let zh = Some(vec!["zh".to_string()]);
        assert_eq!(
            *engine.seen_languages.lock().unwrap(),
            vec![(zh.clone(), zh), (None, None)]
        );
    }

    #[tokio::test]
    async fn test_duplicate_styles_reach_engine_once() {
        let engine = Arc::new(FakeEngine::default());
        let service = service(engine.clone(), TranscriptLookup::Unavailable);

        let styles = vec!["Summary".to_string(), "Summary".to_string()];
        let result = service
            .process_video(URL, Some(&styles), "English")
            .await
            .unwrap();

        assert_eq!(*engine.seen_styles.lock().unwrap(), vec!["Summary".to_string()]);
        assert_eq!(result.metadata.styles_processed, vec!["Summary".to_string()]);
    }

    #[tokio::test]
    async fn test_no_subtitles_fails_before_engine_runs() {
        let engine = Arc::new(FakeEngine::default());
        let service = service(engine.clone(), TranscriptLookup::Languages(Vec::new()));

        let styles = vec!["Summary".to_string()];
        let err = service
            .process_video(URL, Some(&styles), "Chinese")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProcessingError::Validation("No subtitles found for this video.".to_string())
        );
        assert!(engine.seen_dir.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transcript_lookup_uses_video_id() {
        let mut catalog = MockTranscriptCatalog::new();
        catalog
            .expect_list_languages()
            .withf(|video_id| video_id.to_string() == "abc123")
            .times(1)
            .returning(|_| TranscriptLookup::Unavailable);

        let service = VideoProcessingService::new(
            Some(Arc::new(FakeEngine::default())),
            EngineConfig::default(),
            Arc::new(catalog),
        );
        service
            .process_video("https://youtu.be/abc123", None, "English")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_url_is_validation_error() {
        let service = service(Arc::new(FakeEngine::default()), TranscriptLookup::Unavailable);
        let err = service
            .process_video("https://example.com/not-youtube", None, "English")
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Validation(_)));
        assert!(err.to_string().contains("Invalid YouTube URL"));
    }

    #[tokio::test]
    async fn test_unknown_style_is_named_in_error() {
        let service = service(Arc::new(FakeEngine::default()), TranscriptLookup::Unavailable);
        let styles = vec!["NotAStyle".to_string()];
        let err = service
            .process_video(URL, Some(&styles), "English")
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Validation(_)));
        assert!(err.to_string().contains("NotAStyle"));
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let service = VideoProcessingService::new(
            None,
            EngineConfig::default(),
            catalog_returning(TranscriptLookup::Unavailable),
        );
        let err = service.process_video(URL, None, "English").await.unwrap_err();
        assert!(matches!(err, ProcessingError::Configuration(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_engine_errors_are_translated() {
        let timeout = Arc::new(FakeEngine {
            failure: Some(EngineError::Timeout("slow".to_string())),
            ..FakeEngine::default()
        });
        let err = service(timeout, TranscriptLookup::Unavailable)
            .process_video(URL, None, "English")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::Timeout("Video processing timed out.".to_string())
        );

        let failed = Arc::new(FakeEngine {
            failure: Some(EngineError::Failed("External failure.".to_string())),
            ..FakeEngine::default()
        });
        let err = service(failed, TranscriptLookup::Unavailable)
            .process_video(URL, None, "English")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::ExternalService("External failure.".to_string())
        );
    }

    #[tokio::test]
    async fn test_style_query_failure_is_external_error() {
        let engine = Arc::new(FakeEngine {
            styles_unavailable: true,
            ..FakeEngine::default()
        });
        let err = service(engine, TranscriptLookup::Unavailable)
            .process_video(URL, None, "English")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::ExternalService("Failed to retrieve available styles.".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_external_error() {
        let engine = Arc::new(FakeEngine {
            write_nothing: true,
            ..FakeEngine::default()
        });
        let err = service(engine, TranscriptLookup::Unavailable)
            .process_video(URL, None, "English")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::ExternalService("No processed results were returned.".to_string())
        );
    }
}
