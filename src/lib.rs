//! Video Processor - an HTTP service that turns YouTube videos into structured text
//!
//! This library validates processing requests, picks transcript languages, drives a
//! processing engine that writes one output file per requested style, and shapes those
//! files into a single response payload.

pub mod cli;
pub mod config;
pub mod engine;
pub mod processor;
pub mod server;
pub mod styles;
pub mod utils;
pub mod youtube;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use engine::{EngineError, ProcessingEngine, ProcessingJob, SupportsLanguagePreference};
pub use processor::{ProcessingMetadata, ProcessingResult, VideoProcessingService};
pub use styles::{StyleResults, STYLE_CATALOG};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Failure kinds a processing request can end with.
///
/// The message is what callers see, so variants carry it verbatim.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    ExternalService(String),
}

impl ProcessingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalService(message.into())
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::Validation(_) => "validation",
            ProcessingError::Timeout(_) => "timeout",
            ProcessingError::Configuration(_) => "configuration",
            ProcessingError::ExternalService(_) => "external_service",
        }
    }
}
