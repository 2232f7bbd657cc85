use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use crate::processor::VideoProcessingService;

pub mod error;
pub mod schema;

pub use error::ApiError;
pub use schema::{VideoProcessRequest, VideoProcessResponse};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VideoProcessingService>,
}

impl AppState {
    pub fn new(service: VideoProcessingService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/video/process/", post(process_video))
        .route("/video/process", post(process_video))
        .with_state(state)
}

/// Bind and serve until the listener fails or ctrl-c is received
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn process_video(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VideoProcessResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest {
        message: format!("body: {}", rejection.body_text()),
    })?;

    let request = schema::parse_request(body).map_err(|errors| ApiError::BadRequest {
        message: schema::format_field_errors(&errors),
    })?;

    let span = tracing::info_span!("process_video", request_id = %Uuid::new_v4());

    async move {
        tracing::info!("Received request for {}", request.video_url);

        let result = state
            .service
            .process_video(
                &request.video_url,
                request.styles.as_deref(),
                &request.output_language,
            )
            .await;

        match result {
            Ok(data) => Ok(Json(VideoProcessResponse::success(data))),
            Err(e) => {
                tracing::warn!("Request failed ({}): {}", e.kind(), e);
                Err(ApiError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}
