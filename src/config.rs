//! Configuration types for resume screening.
//!
//! Every knob of the pipeline lives in [`PipelineConfig`], built through
//! [`PipelineConfigBuilder`]. The credential for the model service is part of
//! this value and is handed to each component at construction time; nothing
//! in the library reads process-wide state such as environment variables.
//! The binary is the only place that maps env vars onto a config.

use crate::error::CvError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model for both page transcription and classification.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for one screening pipeline.
///
/// # Example
/// ```rust
/// use cv_screen::{OcrMode, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .api_key("sk-test")
///     .concurrency(4)
///     .ocr_mode(OcrMode::Parallel)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Credential for the model service. Default: None.
    ///
    /// When absent every model call fails with
    /// [`crate::error::ModelError::NotConfigured`]; the pipeline still runs
    /// and reports `model_call_failed` instead of refusing to start.
    pub api_key: Option<String>,

    /// Pre-constructed provider used for every call. Takes precedence over
    /// `api_key`. Useful for non-OpenAI backends or custom middleware.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Vision model used to transcribe rasterised pages. Default: gpt-4o-mini.
    pub ocr_model: String,

    /// Model used for extraction and classification. Default: gpt-4o-mini.
    pub classifier_model: String,

    /// How the OCR fallback schedules pages. Default: [`OcrMode::Parallel`].
    pub ocr_mode: OcrMode,

    /// Width of the OCR worker pool. Default: 8.
    ///
    /// Pages are independent, so wall-clock time shrinks roughly in
    /// proportion to this value until the provider starts rate limiting.
    pub concurrency: usize,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Sampling temperature for every model call. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens per model answer. Default: 4096.
    pub max_tokens: usize,

    /// Deadline for each model call in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library. Default: None, which
    /// tries the working directory and then the system library path.
    pub pdfium_library: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page OCR progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: None,
            ocr_model: DEFAULT_MODEL.to_string(),
            classifier_model: DEFAULT_MODEL.to_string(),
            ocr_mode: OcrMode::default(),
            concurrency: 8,
            max_rendered_pixels: 2000,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 60,
            password: None,
            pdfium_library: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("ocr_model", &self.ocr_model)
            .field("classifier_model", &self.classifier_model)
            .field("ocr_mode", &self.ocr_mode)
            .field("concurrency", &self.concurrency)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_library", &self.pdfium_library)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether model calls have any chance of succeeding.
    pub fn model_configured(&self) -> bool {
        self.provider.is_some() || self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn classifier_model(mut self, model: impl Into<String>) -> Self {
        self.config.classifier_model = model.into();
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, CvError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(CvError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.max_rendered_pixels < 100 {
            return Err(CvError::InvalidConfig(format!(
                "max_rendered_pixels must be ≥ 100, got {}",
                c.max_rendered_pixels
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(CvError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.ocr_model.trim().is_empty() || c.classifier_model.trim().is_empty() {
            return Err(CvError::InvalidConfig("Model names must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// How the OCR fallback schedules page transcriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// Up to `concurrency` pages in flight at once. (default)
    #[default]
    Parallel,
    /// One page at a time, in page order.
    Sequential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.ocr_model, "gpt-4o-mini");
        assert_eq!(c.ocr_mode, OcrMode::Parallel);
        assert_eq!(c.api_timeout_secs, 60);
        assert!(!c.model_configured());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = PipelineConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, CvError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(PipelineConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn empty_api_key_is_not_configured() {
        let c = PipelineConfig::builder().api_key("").build().unwrap();
        assert!(!c.model_configured());
        let c = PipelineConfig::builder().api_key("sk-x").build().unwrap();
        assert!(c.model_configured());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = PipelineConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
