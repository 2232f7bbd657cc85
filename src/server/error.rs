use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::ProcessingError;

#[derive(Debug)]
pub enum ApiError {
    /// Request body failed the shape check
    BadRequest { message: String },
    Processing(ProcessingError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Processing(error) => match error {
                ProcessingError::Validation(_) => StatusCode::BAD_REQUEST,
                ProcessingError::Timeout(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ProcessingError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ProcessingError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Processing(error) => error.to_string(),
        }
    }
}

impl From<ProcessingError> for ApiError {
    fn from(error: ProcessingError) -> Self {
        ApiError::Processing(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        (
            status,
            Json(json!({
                "status": "error",
                "error": self.message(),
                "code": status.as_u16(),
            })),
        )
            .into_response()
    }
}
