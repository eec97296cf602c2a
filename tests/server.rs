//! Router tests for `POST /procesar-cv/` and `GET /health`, driven through
//! `tower::ServiceExt::oneshot` without binding a socket.

#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use cv_screen::error::ModelError;
use cv_screen::server::{router, AppState, ServerConfig};
use cv_screen::{ModelClient, PipelineConfig, Screener};
use edgequake_llm::ImageData;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "cvscreenboundary7MA4YWxkTrZu0gW";

struct ScriptedModel(Result<String, ModelError>);

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn transcribe(&self, _image: ImageData, _instruction: &str) -> Result<String, ModelError> {
        Ok(String::new())
    }

    async fn complete_json(&self, _prompt: &str) -> Result<String, ModelError> {
        self.0.clone()
    }
}

fn app(answer: Result<String, ModelError>) -> axum::Router {
    app_with(answer, &ServerConfig::default())
}

fn app_with(answer: Result<String, ModelError>, config: &ServerConfig) -> axum::Router {
    let screener = Screener::with_model(PipelineConfig::default(), Arc::new(ScriptedModel(answer)));
    router(AppState::new(screener, config))
}

fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/procesar-cv/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

#[tokio::test]
async fn health_reports_version_and_model_state() {
    let response = app(Ok("{}".into()))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["model_configured"], false);
}

#[tokio::test]
async fn missing_file_field_is_a_bad_request() {
    let body = multipart_body("documento", "cv.pdf", b"%PDF-1.4");
    let response = app(Ok("{}".into()))
        .oneshot(upload_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn non_multipart_request_is_a_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/procesar-cv/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app(Ok("{}".into())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let body = multipart_body("file", "cv.pdf", &vec![b'x'; 64 * 1024]);

    let response = app_with(Ok("{}".into()), &config)
        .oneshot(upload_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn unreadable_upload_still_gets_a_classification() {
    // Not a PDF: extraction degrades to empty text and the classifier still runs.
    let answer = json!({
        "informacion_general": { "nombre": "" },
        "candidato": false,
        "motivo_no_candidato": "Documento vacío"
    });
    let body = multipart_body("file", "cv.pdf", b"this is not a pdf");

    let response = app(Ok(answer.to_string()))
        .oneshot(upload_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["candidato"], false);
    assert_eq!(body["motivo_no_candidato"], "Documento vacío");
    assert_eq!(body["informacion_general"]["habilidades"], json!([]));
}

#[tokio::test]
async fn model_failure_is_a_200_with_error_tag() {
    let body = multipart_body("file", "cv.pdf", b"%PDF-1.4 truncated");

    let response = app(Err(ModelError::NotConfigured))
        .oneshot(upload_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "error": "model_call_failed" }));
}

#[tokio::test]
async fn unparseable_answer_is_returned_raw() {
    let body = multipart_body("file", "cv.pdf", b"%PDF-1.4 truncated");

    let response = app(Ok("no JSON here".into()))
        .oneshot(upload_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "raw_response": "no JSON here" })
    );
}
