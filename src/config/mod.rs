use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable holding the OpenAI credential
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Processing engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Credential for the chat-completions endpoint
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Chat-completions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout for text generation calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for fetching subtitles with yt-dlp
    #[serde(default = "default_subtitle_timeout_secs")]
    pub subtitle_timeout_secs: u64,

    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: String,

    /// Subtitle languages asked for when no preference was computed
    #[serde(default = "default_subtitle_languages")]
    pub default_subtitle_languages: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            subtitle_timeout_secs: default_subtitle_timeout_secs(),
            yt_dlp_path: default_yt_dlp_path(),
            default_subtitle_languages: default_subtitle_languages(),
        }
    }
}

impl EngineConfig {
    /// The configured credential, treating blank values as missing
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn subtitle_timeout(&self) -> Duration {
        Duration::from_secs(self.subtitle_timeout_secs)
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults, then apply the environment
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            serde_yaml::from_str::<Config>(&content).context("Failed to parse config file")?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        if let Ok(key) = std::env::var(OPENAI_API_KEY_ENV) {
            config.engine.openai_api_key = Some(key);
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("video-processor").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let api_url = Url::parse(&self.engine.api_url)
            .with_context(|| format!("Invalid engine.api_url: {}", self.engine.api_url))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            anyhow::bail!("engine.api_url must use HTTP or HTTPS protocol");
        }

        if self.engine.request_timeout_secs == 0 || self.engine.subtitle_timeout_secs == 0 {
            anyhow::bail!("Engine timeouts must be greater than zero");
        }

        if self.engine.model.trim().is_empty() {
            anyhow::bail!("engine.model must be configured");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen Address: {}:{}", self.server.host, self.server.port);
        println!("  API URL: {}", self.engine.api_url);
        println!("  Model: {}", self.engine.model);
        println!(
            "  API Key: {}",
            if self.engine.api_key().is_some() {
                "configured"
            } else {
                "not configured"
            }
        );
        println!("  yt-dlp: {}", self.engine.yt_dlp_path);
        println!(
            "  Timeouts: {}s generation, {}s subtitles",
            self.engine.request_timeout_secs, self.engine.subtitle_timeout_secs
        );
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_subtitle_timeout_secs() -> u64 {
    120
}

fn default_yt_dlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_subtitle_languages() -> Vec<String> {
    vec!["en.*".to_string(), "zh.*".to_string()]
}
