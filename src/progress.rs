//! Progress-callback trait for OCR fallback events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to observe the
//! per-page fan-out. Nothing fires when a document has a text layer, since
//! OCR never starts in that case.
//!
//! # Example
//!
//! ```rust
//! use cv_screen::{OcrProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl OcrProgressCallback for Counter {
//!     fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _text_len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the OCR fallback as it processes each page.
///
/// In [`crate::config::OcrMode::Parallel`] the page-level methods may be
/// called concurrently and in any order. All methods default to no-ops.
pub trait OcrProgressCallback: Send + Sync {
    /// Called once the page count is known, before any page is rendered.
    fn on_ocr_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered.
    ///
    /// `page_num` is 1-indexed.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page was transcribed.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page failed to render or transcribe.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_ocr_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_ocr_start(2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, 42);
        cb.on_page_error(2, 2, "render failed".to_string());
        cb.on_ocr_complete(2, 1);
    }
}
