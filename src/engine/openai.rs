use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use super::subtitles::vtt_to_text;
use super::{EngineError, ProcessingEngine, ProcessingJob};
use crate::config::EngineConfig;
use crate::styles::strip_engine_names;
use crate::utils::sanitize_filename;

/// Longest transcript sent to the model, in characters
const MAX_TRANSCRIPT_CHARS: usize = 120_000;

static STYLE_PROMPTS: [(&str, &str); 5] = [
    (
        "Summary",
        r#"
  You summarize video transcripts.
  Produce a concise summary: a one-paragraph overview followed by the key points as a
  bulleted list. Keep names, numbers and conclusions exact. Do not invent content that is
  not in the transcript.
"#,
    ),
    (
        "Educational",
        r#"
  You turn video transcripts into study material.
  Organize the content into sections with headings, explain every technical term the
  first time it appears, and end with a short list of takeaways a student should remember.
"#,
    ),
    (
        "Balanced and Detailed",
        r#"
  You rewrite video transcripts as detailed, well-structured articles.
  Cover every topic discussed in the order it appears, keep the speaker's arguments and
  examples, and remove filler words, repetitions and off-topic chatter.
"#,
    ),
    (
        "Q&A Generation",
        r#"
  You generate question and answer pairs from video transcripts.
  Write 8-15 questions that test understanding of the content, each followed by an answer
  grounded in the transcript. Format each pair as "Q: ..." and "A: ...".
"#,
    ),
    (
        "Narrative Rewriting",
        r#"
  You retell video transcripts as flowing narrative prose.
  Write in third person, keep the chronology and the facts, and make the text read like a
  story rather than a transcript.
"#,
    ),
];

/// Transcript text plus the title yt-dlp reported
struct FetchedTranscript {
    title: String,
    text: String,
}

/// Engine backed by yt-dlp subtitles and an OpenAI-compatible chat-completions API
pub struct OpenAiEngine {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    yt_dlp_path: String,
    subtitle_timeout: Duration,
    default_subtitle_languages: Vec<String>,
}

impl OpenAiEngine {
    /// Create an engine; fails when no API key is configured
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key()
            .context("OPENAI_API_KEY is not configured")?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            yt_dlp_path: config.yt_dlp_path.clone(),
            subtitle_timeout: config.subtitle_timeout(),
            default_subtitle_languages: config.default_subtitle_languages.clone(),
        })
    }

    fn prompt_for(style: &str) -> Option<&'static str> {
        STYLE_PROMPTS
            .iter()
            .find(|(name, _)| *name == style)
            .map(|(_, prompt)| *prompt)
    }

    /// Download subtitles with yt-dlp and flatten them to text
    async fn fetch_transcript(
        &self,
        video_url: &str,
        preferred_languages: Option<&[String]>,
    ) -> Result<FetchedTranscript, EngineError> {
        let work_dir = TempDir::new().map_err(|e| {
            EngineError::Failed(format!("Failed to create subtitle directory: {}", e))
        })?;

        let languages = match preferred_languages {
            Some(languages) if !languages.is_empty() => languages.to_vec(),
            _ => self.default_subtitle_languages.clone(),
        };
        let sub_langs = languages.join(",");
        let template = work_dir.path().join("transcript.%(ext)s");

        tracing::debug!("Fetching subtitles ({}) for: {}", sub_langs, video_url);

        let mut command = Command::new(&self.yt_dlp_path);
        command
            .args([
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-format",
                "vtt",
                "--sub-langs",
                sub_langs.as_str(),
                "--no-playlist",
                // --print would otherwise imply simulation and nothing gets written
                "--no-simulate",
                "--print",
                "title",
                "--output",
            ])
            .arg(&template)
            .arg(video_url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.subtitle_timeout, command.output())
            .await
            .map_err(|_| {
                EngineError::Timeout(format!(
                    "Fetching subtitles timed out after {}s.",
                    self.subtitle_timeout.as_secs()
                ))
            })?
            .map_err(|e| EngineError::Failed(format!("Failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "yt-dlp failed to fetch subtitles: {}",
                error.trim()
            )));
        }

        let title = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("video")
            .to_string();

        let subtitle_path = pick_subtitle_file(work_dir.path(), &languages)?;
        let vtt = fs_err::read_to_string(&subtitle_path)
            .map_err(|e| EngineError::Failed(format!("Failed to read subtitles: {}", e)))?;

        let mut text = vtt_to_text(&vtt);
        if text.is_empty() {
            return Err(EngineError::Failed(
                "No transcript text available for this video.".to_string(),
            ));
        }
        let cut = text
            .char_indices()
            .nth(MAX_TRANSCRIPT_CHARS)
            .map(|(index, _)| index);
        if let Some(cut) = cut {
            tracing::warn!("Transcript truncated to {} characters", MAX_TRANSCRIPT_CHARS);
            text.truncate(cut);
        }

        Ok(FetchedTranscript { title, text })
    }

    /// Run one chat completion for a style
    async fn generate(
        &self,
        prompt: &str,
        transcript: &str,
        output_language: &str,
    ) -> Result<String, EngineError> {
        let system_prompt = format!("{}\n  Write the entire answer in {}.", prompt, output_language);

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": format!("Video transcript:\n\n{}", transcript),
                    },
                ],
                "temperature": 0.3,
            }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Failed(format!(
                "Text generation failed: HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response.json::<Value>().await.map_err(request_error)?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::Failed("Invalid API response structure from text generation.".to_string())
            })
    }
}

fn request_error(error: reqwest::Error) -> EngineError {
    if error.is_timeout() {
        EngineError::Timeout("Text generation timed out.".to_string())
    } else {
        EngineError::Failed(format!("Text generation request failed: {}", error))
    }
}

/// Language tag of a `transcript.<lang>.vtt` file
fn subtitle_language(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_prefix("transcript.")?
        .strip_suffix(".vtt")
}

fn language_matches(language: &str, wanted: &str) -> bool {
    match wanted.strip_suffix(".*") {
        Some(prefix) => language.starts_with(prefix),
        None => language == wanted,
    }
}

/// Subtitle file for the most preferred language, else the first by name
fn pick_subtitle_file(dir: &Path, languages: &[String]) -> Result<PathBuf, EngineError> {
    let mut files: Vec<PathBuf> = fs_err::read_dir(dir)
        .map_err(|e| EngineError::Failed(format!("Failed to list subtitles: {}", e)))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && subtitle_language(path).is_some())
        .collect();
    files.sort();

    for wanted in languages {
        if let Some(found) = files.iter().find(|path| {
            subtitle_language(path).is_some_and(|language| language_matches(language, wanted))
        }) {
            return Ok(found.clone());
        }
    }

    files.into_iter().next().ok_or_else(|| {
        EngineError::Failed("No subtitles were downloaded for this video.".to_string())
    })
}

/// Title part of output filenames; never contains a style name
fn file_title(title: &str) -> String {
    let stripped = strip_engine_names(&sanitize_filename(title));
    let title = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches([' ', '-', '_'])
        .to_string();

    if title.is_empty() {
        "video".to_string()
    } else {
        title
    }
}

fn output_file_name(title: &str, style: &str) -> String {
    format!("{} - {}.txt", title, style)
}

#[async_trait]
impl ProcessingEngine for OpenAiEngine {
    async fn available_styles(&self) -> Result<HashSet<String>, EngineError> {
        Ok(STYLE_PROMPTS
            .iter()
            .map(|(name, _)| name.to_string())
            .collect())
    }

    async fn process_youtube_url(&self, job: &ProcessingJob<'_>) -> Result<(), EngineError> {
        tracing::info!("Fetching transcript for: {}", job.video_url);
        let transcript = self
            .fetch_transcript(job.video_url, job.transcript_languages)
            .await?;
        let title = file_title(&transcript.title);

        for style in job.styles {
            let prompt = Self::prompt_for(style)
                .ok_or_else(|| EngineError::Failed(format!("Unsupported style: {}", style)))?;

            tracing::info!("Generating '{}' in {}", style, job.output_language);
            let content = self
                .generate(prompt, &transcript.text, job.output_language)
                .await?;

            let path = job.output_dir.join(output_file_name(&title, style));
            fs_err::write(&path, content)
                .map_err(|e| EngineError::Failed(format!("Failed to write output: {}", e)))?;
            tracing::debug!("Wrote {}", path.display());
        }

        Ok(())
    }
}
