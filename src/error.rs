//! Error types for the cv-screen library.
//!
//! Three error types map onto three blast radii:
//!
//! * [`CvError`] — **Request-level**: the request cannot proceed at all
//!   (input file missing, upload unreadable, bad configuration). Returned as
//!   `Err(CvError)` from the top-level `screen_*` entry points and turned into
//!   a JSON error body by the HTTP layer.
//!
//! * [`PageError`] — **Page-level**: one page's text layer, raster or
//!   transcription failed. Stored inside [`crate::output::PageResult`]; the
//!   page contributes empty text and its siblings carry on.
//!
//! * [`ModelError`] — **Call-level**: one language-model call failed. It is
//!   the error half of every model call's `Result`, wrapped into a
//!   [`PageError`] by OCR and into `{"error": "model_call_failed"}` by
//!   classification.
//!
//! [`CvError::DocumentOpen`] and [`CvError::PdfiumBindingFailed`] are
//! produced by [`crate::pipeline::document`] but absorbed by the extractors:
//! an unopenable document degrades to empty text instead of failing the
//! request.

use std::path::PathBuf;
use thiserror::Error;

/// Error tag returned to callers when the classification call fails.
pub const MODEL_CALL_FAILED: &str = "model_call_failed";

/// Request-level errors returned by the cv-screen library.
#[derive(Debug, Error)]
pub enum CvError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The multipart request carried no `file` field.
    #[error("No document uploaded: expected a multipart field named '{field}'")]
    MissingUpload { field: String },

    /// The multipart body could not be read.
    #[error("Failed to read uploaded document: {0}")]
    Upload(String),

    /// The request body exceeded the configured upload limit.
    #[error("Uploaded document too large: {0}")]
    UploadTooLarge(String),

    /// The uploaded document could not be staged on disk.
    #[error("Failed to stage uploaded document: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    // ── Document errors ───────────────────────────────────────────────────
    /// pdfium could not parse the document at all.
    #[error("Document '{path}' could not be opened: {detail}")]
    DocumentOpen { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Place libpdfium next to the binary, install it system-wide, or pass --pdfium-library."
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CvError {
    /// Whether the caller sent something unusable, as opposed to the
    /// service failing on a valid request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CvError::MissingUpload { .. }
                | CvError::Upload(_)
                | CvError::UploadTooLarge(_)
                | CvError::InvalidInput { .. }
        )
    }
}

/// A non-fatal error for a single page.
///
/// Page numbers are 1-indexed for display; `PageResult::page_index` stays
/// 0-based.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page's embedded text could not be read.
    #[error("Page {page}: text layer unreadable: {detail}")]
    TextUnreadable { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// PNG/base64 encoding of the rendered page failed.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The vision model call failed.
    #[error("Page {page}: transcription failed: {source}")]
    TranscriptionFailed {
        page: usize,
        #[source]
        source: ModelError,
    },
}

/// Failure of a single language-model call.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ModelError {
    /// No credential or provider was configured.
    #[error("model provider is not configured (missing API key)")]
    NotConfigured,

    /// The call exceeded the configured deadline.
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider returned an error (network, auth, quota, bad response).
    #[error("model API error: {0}")]
    Api(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_failure_display_includes_cause() {
        let e = PageError::TranscriptionFailed {
            page: 3,
            source: ModelError::Timeout { secs: 60 },
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 3"), "got: {msg}");
        assert!(msg.contains("60s"), "got: {msg}");
    }

    #[test]
    fn missing_upload_is_client_error() {
        let e = CvError::MissingUpload {
            field: "file".into(),
        };
        assert!(e.is_client_error());
        assert!(e.to_string().contains("'file'"));
    }

    #[test]
    fn internal_is_not_client_error() {
        assert!(!CvError::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn not_configured_display() {
        assert!(ModelError::NotConfigured.to_string().contains("API key"));
    }
}
