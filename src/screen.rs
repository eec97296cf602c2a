//! Screening entry points: extraction policy and the end-to-end run.
//!
//! [`Screener`] owns the configuration and the model client for the lifetime
//! of a process and is shared across requests. Each `screen_*` method is one
//! request: stage the input, extract text (text layer first, OCR only when
//! that comes back empty), classify, normalise.
//!
//! Only staging can fail a request. Once a file is on disk every later
//! problem degrades into the result: an unopenable document is empty text,
//! a failed page is an empty line, a failed model call is
//! `{"error": "model_call_failed"}`.

use crate::config::PipelineConfig;
use crate::error::CvError;
use crate::output::{
    ClassificationResult, ExtractionMethod, ExtractionOutput, ScreeningOutput, ScreeningStats,
};
use crate::pipeline::document::{Document, PdfDocument};
use crate::pipeline::llm::{ModelClient, ProviderClient};
use crate::pipeline::{classify, input, normalize, ocr, text_layer};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Resume screening pipeline.
pub struct Screener {
    config: PipelineConfig,
    model: Arc<dyn ModelClient>,
}

impl Screener {
    /// Build a screener whose model calls go through `edgequake-llm`.
    pub fn new(config: PipelineConfig) -> Self {
        let model: Arc<dyn ModelClient> = Arc::new(ProviderClient::from_config(&config));
        Self { config, model }
    }

    /// Build a screener around an arbitrary [`ModelClient`].
    pub fn with_model(config: PipelineConfig, model: Arc<dyn ModelClient>) -> Self {
        Self { config, model }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Recover the text of `document`.
    ///
    /// A non-empty text layer is returned as is and OCR is never attempted.
    /// Otherwise every page goes through the vision model.
    pub async fn extract_text(&self, document: &dyn Document) -> ExtractionOutput {
        let text = text_layer::extract_text_layer(document).await;
        if !text.is_empty() {
            info!("Using text layer ({} bytes)", text.len());
            return ExtractionOutput {
                text,
                method: ExtractionMethod::TextLayer,
                pages: Vec::new(),
            };
        }

        info!("Text layer empty, falling back to OCR");
        let (text, pages) = ocr::extract_with_ocr(document, self.model.as_ref(), &self.config).await;
        ExtractionOutput {
            text,
            method: ExtractionMethod::Ocr,
            pages,
        }
    }

    /// Classify already-extracted text.
    pub async fn classify_text(&self, text: &str) -> ClassificationResult {
        normalize::normalize(classify::classify(self.model.as_ref(), text).await)
    }

    /// Extract, classify and normalise one document.
    pub async fn screen_document(&self, document: &dyn Document) -> ScreeningOutput {
        let total_start = Instant::now();

        let extraction = self.extract_text(document).await;
        let extraction_duration_ms = total_start.elapsed().as_millis() as u64;

        let classify_start = Instant::now();
        let result = self.classify_text(&extraction.text).await;
        let classification_duration_ms = classify_start.elapsed().as_millis() as u64;

        let stats = ScreeningStats {
            extraction_duration_ms,
            classification_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Screening complete: {:?}, {} failed pages, {}ms total",
            extraction.method,
            extraction.failed_pages(),
            stats.total_duration_ms
        );

        ScreeningOutput {
            result,
            extraction,
            stats,
        }
    }

    /// Screen a document already on disk.
    pub async fn screen_file(&self, path: impl AsRef<Path>) -> ScreeningOutput {
        let document = PdfDocument::new(path.as_ref())
            .with_password(self.config.password.clone())
            .with_library(self.config.pdfium_library.clone());
        self.screen_document(&document).await
    }

    /// Screen uploaded bytes. The temporary copy is removed before returning.
    pub async fn screen_bytes(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<ScreeningOutput, CvError> {
        let staged = input::stage_upload(bytes, file_name)?;
        Ok(self.screen_file(staged.path()).await)
    }

    /// Screen a local path or an HTTP(S) URL.
    pub async fn screen_input(&self, input: &str) -> Result<ScreeningOutput, CvError> {
        info!("Screening: {}", input);
        let resolved = input::resolve_input(input, self.config.download_timeout_secs).await?;
        Ok(self.screen_file(resolved.path()).await)
    }
}

/// One-shot convenience over [`Screener::screen_input`].
pub async fn screen(input: &str, config: &PipelineConfig) -> Result<ScreeningOutput, CvError> {
    Screener::new(config.clone()).screen_input(input).await
}
