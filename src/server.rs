/*!
 * HTTP front end.
 *
 * Exposes `POST /translate` over axum. Request bodies that cannot be read as a
 * translation request are answered with 422, translation failures with 400;
 * both carry a `{"detail": ...}` body.
 */

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::errors::TranslationError;
use crate::providers::truncate_text;
use crate::translation::TranslationService;

/// Shared state for request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: TranslationService,
}

impl AppState {
    pub fn new(service: TranslationService) -> Self {
        Self { service }
    }
}

/// Body of `POST /translate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_from_lang")]
    pub from_lang: String,
    #[serde(default = "default_to_lang")]
    pub to_lang: String,
}

fn default_from_lang() -> String {
    "en".to_string()
}

fn default_to_lang() -> String {
    "zh".to_string()
}

/// Successful response of `POST /translate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// Error response carrying a status code and a `detail` message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl From<TranslationError> for ApiError {
    fn from(error: TranslationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error.to_string())
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/translate", post(translate_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn translate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected translation request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    info!(
        "Translation request {} -> {}: {}",
        request.from_lang,
        request.to_lang,
        truncate_text(&request.text, 50)
    );

    let outcome = state.service.translate(&request.text).await.map_err(|e| {
        error!("Translation failed: {}", e);
        ApiError::from(e)
    })?;

    if outcome.is_partial() {
        warn!(
            "Returning partial translation ({} of {} chunks failed)",
            outcome.failed_chunks.len(),
            outcome.chunk_count
        );
    }

    Ok(Json(TranslateResponse {
        translated_text: outcome.text,
    }))
}

/// Run the HTTP server until Ctrl-C
pub async fn serve(service: TranslationService, host: &str, port: u16) -> Result<()> {
    service
        .initialize()
        .await
        .context("Failed to initialize translation backend")?;
    info!("Translation backend '{}' initialized", service.backend().name());

    let app = router(Arc::new(AppState::new(service.clone())));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind server to {}:{}", host, port))?;

    info!("Server listening on http://{}", listener.local_addr()?);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    service.close().await;
    info!("Translation backend shut down");

    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
