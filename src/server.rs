//! HTTP surface: `POST /procesar-cv/` and `GET /health`.
//!
//! The upload handler stages the `file` field, runs the [`Screener`] and
//! returns the [`ClassificationResult`] as the response body. Model and parse
//! failures are part of that result and still answer 200; only a request the
//! pipeline could not start (no upload, unreadable or oversized body, staging
//! failure) gets an error status.
//!
//! [`ClassificationResult`]: crate::output::ClassificationResult

use crate::error::CvError;
use crate::screen::Screener;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name of the multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "file";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body. Default: 20 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub screener: Arc<Screener>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(screener: Screener, config: &ServerConfig) -> Self {
        Self {
            screener: Arc::new(screener),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/procesar-cv/", post(procesar_cv))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("cv-screen listening on {addr}");
    axum::serve(listener, app).await
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn procesar_cv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| CvError::Upload(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(upload_error)?;
        info!(
            "Received upload {:?} ({} bytes)",
            file_name.as_deref().unwrap_or("<unnamed>"),
            bytes.len()
        );

        let output = state
            .screener
            .screen_bytes(&bytes, file_name.as_deref())
            .await?;
        return Ok((StatusCode::OK, Json(output.result)).into_response());
    }

    Err(CvError::MissingUpload {
        field: UPLOAD_FIELD.to_string(),
    }
    .into())
}

/// Keep the body-limit case apart so it answers 413 instead of 400.
fn upload_error(e: MultipartError) -> CvError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CvError::UploadTooLarge(e.body_text())
    } else {
        CvError::Upload(e.body_text())
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model_configured: bool,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok",
        version: VERSION,
        model_configured: state.screener.config().model_configured(),
    };
    (StatusCode::OK, Json(response))
}

// ── Errors ───────────────────────────────────────────────────────────────

/// A request-level failure rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError(CvError);

impl From<CvError> for ApiError {
    fn from(e: CvError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!("Rejected request: {}", self.0);
            match self.0 {
                CvError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            }
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.addr(), "0.0.0.0:8000");
        assert_eq!(c.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn client_errors_map_to_4xx() {
        let r = ApiError::from(CvError::MissingUpload {
            field: "file".into(),
        })
        .into_response();
        assert_eq!(r.status(), StatusCode::BAD_REQUEST);

        let r = ApiError::from(CvError::UploadTooLarge("length limit exceeded".into()))
            .into_response();
        assert_eq!(r.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let r = ApiError::from(CvError::Internal("boom".into())).into_response();
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
