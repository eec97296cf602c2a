//! # cv-screen
//!
//! Screen resumes with language models: recover the text of a PDF, evaluate
//! it against a fixed hiring rubric, and return a structured profile.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      local path, HTTP(S) URL, or uploaded bytes
//!  ├─ 2. Text layer embedded page text via pdfium
//!  │      └─ empty? ─▶ OCR: render each page, vision model transcribes,
//!  │                   pages run concurrently and are reassembled in order
//!  ├─ 3. Classify   rubric prompt + text, JSON-mode completion
//!  └─ 4. Normalise  parsed profile, or the raw answer if it is not JSON
//! ```
//!
//! Individual failures never abort a run: a broken page is an empty line, an
//! unparseable answer is returned as `raw_response`, a failed model call is
//! `{"error": "model_call_failed"}`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv_screen::{PipelineConfig, Screener};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let screener = Screener::new(config);
//!     let output = screener.screen_input("cv.pdf").await?;
//!     println!("{}", serde_json::to_string_pretty(&output.result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router for `POST /procesar-cv/` |
//! | `cli`    | on      | The `cv-screen` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod screen;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrMode, PipelineConfig, PipelineConfigBuilder};
pub use error::{CvError, ModelError, PageError};
pub use output::{
    CandidateProfile, Classification, ClassificationResult, ExtractionMethod, ExtractionOutput,
    PageResult, ScreeningOutput, ScreeningStats,
};
pub use pipeline::document::{Document, PdfDocument};
pub use pipeline::llm::{ModelClient, ProviderClient};
pub use progress::{NoopProgressCallback, OcrProgressCallback, ProgressCallback};
pub use screen::{screen, Screener};
