use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::processor::{ProcessingResult, DEFAULT_OUTPUT_LANGUAGE};

/// Body of `POST /video/process/`, built by [`parse_request`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoProcessRequest {
    pub video_url: String,
    pub styles: Option<Vec<String>>,
    pub output_language: String,
}

fn default_output_language() -> String {
    DEFAULT_OUTPUT_LANGUAGE.to_string()
}

/// Successful response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoProcessResponse {
    pub status: String,
    pub data: ProcessingResult,
}

impl VideoProcessResponse {
    pub fn success(data: ProcessingResult) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// A single shape problem, rendered as `field: message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: impl Into<String>, message: &'static str) -> Self {
        Self {
            field: field.into(),
            message,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

const FIELD_REQUIRED: &str = "Field required";
const NOT_A_STRING: &str = "Input should be a valid string";
const NOT_A_LIST: &str = "Input should be a valid list";
const NOT_AN_OBJECT: &str = "Input should be a valid dictionary or object to extract fields from";

/// Join field errors the way they are reported to clients
pub fn format_field_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "Invalid request.".to_string();
    }
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check the body shape, collecting every problem rather than stopping at the first
pub fn parse_request(body: Value) -> Result<VideoProcessRequest, Vec<FieldError>> {
    let Value::Object(mut fields) = body else {
        return Err(vec![FieldError::new("", NOT_AN_OBJECT)]);
    };

    let mut errors = Vec::new();

    let video_url = match fields.remove("video_url") {
        Some(Value::String(url)) => Some(url),
        Some(_) => {
            errors.push(FieldError::new("video_url", NOT_A_STRING));
            None
        }
        None => {
            errors.push(FieldError::new("video_url", FIELD_REQUIRED));
            None
        }
    };

    let styles = match fields.remove("styles") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => {
            let mut styles = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::String(style) => styles.push(style),
                    _ => errors.push(FieldError::new(format!("styles.{}", index), NOT_A_STRING)),
                }
            }
            Some(styles)
        }
        Some(_) => {
            errors.push(FieldError::new("styles", NOT_A_LIST));
            None
        }
    };

    let output_language = match fields.remove("output_language") {
        None => Some(default_output_language()),
        Some(Value::String(language)) => Some(language),
        Some(_) => {
            errors.push(FieldError::new("output_language", NOT_A_STRING));
            None
        }
    };

    match (video_url, output_language) {
        (Some(video_url), Some(output_language)) if errors.is_empty() => Ok(VideoProcessRequest {
            video_url,
            styles,
            output_language,
        }),
        _ => Err(errors),
    }
}
