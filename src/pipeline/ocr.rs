//! OCR fallback: rasterise pages and let a vision model read them.
//!
//! [`transcribe_page`] handles exactly one page and always returns a
//! [`PageResult`]; render, encode and model failures become a failed result
//! with empty text. [`extract_with_ocr`] fans every page of a document out to
//! it and stitches the texts back together.
//!
//! ## Ordering
//!
//! In parallel mode pages finish in whatever order the model answers. The
//! results are sorted by `page_index` before joining, so the output follows
//! the document: contact details stay on top and the body below, which the
//! classifier relies on. A failed page still occupies its slot as an empty
//! line.

use crate::config::{OcrMode, PipelineConfig};
use crate::error::PageError;
use crate::output::PageResult;
use crate::pipeline::document::Document;
use crate::pipeline::encode;
use crate::pipeline::llm::ModelClient;
use crate::prompts::OCR_PAGE_PROMPT;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{error, info, warn};

/// Render page `index` (0-based) and transcribe it.
pub async fn transcribe_page(
    document: &dyn Document,
    model: &dyn ModelClient,
    index: usize,
    config: &PipelineConfig,
) -> PageResult {
    let start = Instant::now();
    let elapsed = || start.elapsed().as_millis() as u64;

    let image = match document.render_page(index, config.max_rendered_pixels).await {
        Ok(image) => image,
        Err(e) => return PageResult::failure(index, e, elapsed()),
    };

    let image_data = match encode::encode_page(index, &image) {
        Ok(data) => data,
        Err(e) => return PageResult::failure(index, e, elapsed()),
    };
    drop(image);

    match model.transcribe(image_data, OCR_PAGE_PROMPT).await {
        Ok(text) => PageResult::success(index, text, elapsed()),
        Err(source) => PageResult::failure(
            index,
            PageError::TranscriptionFailed {
                page: index + 1,
                source,
            },
            elapsed(),
        ),
    }
}

/// Transcribe every page of `document` and join the texts in page order.
///
/// Returns the joined text (trimmed) and the per-page results sorted by
/// page index. A document whose page count cannot be read yields empty text
/// and no pages.
pub async fn extract_with_ocr(
    document: &dyn Document,
    model: &dyn ModelClient,
    config: &PipelineConfig,
) -> (String, Vec<PageResult>) {
    let total_pages = match document.page_count().await {
        Ok(n) => n,
        Err(e) => {
            error!("OCR could not open the document: {}", e);
            return (String::new(), Vec::new());
        }
    };
    info!(
        "OCR fallback: {} pages, {:?} mode",
        total_pages, config.ocr_mode
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_ocr_start(total_pages);
    }

    let mut pages = match config.ocr_mode {
        OcrMode::Parallel => process_concurrent(document, model, total_pages, config).await,
        OcrMode::Sequential => process_sequential(document, model, total_pages, config).await,
    };
    pages.sort_by_key(|p| p.page_index);

    let succeeded = pages.iter().filter(|p| !p.is_failed()).count();
    if succeeded < pages.len() {
        warn!("OCR: {}/{} pages failed", pages.len() - succeeded, pages.len());
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_ocr_complete(total_pages, succeeded);
    }

    (assemble_pages(&pages), pages)
}

/// Join page texts with newlines, in the order given, and trim the result.
pub fn assemble_pages(pages: &[PageResult]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Up to `config.concurrency` pages in flight (at least one); results in
/// completion order.
async fn process_concurrent(
    document: &dyn Document,
    model: &dyn ModelClient,
    total_pages: usize,
    config: &PipelineConfig,
) -> Vec<PageResult> {
    let tasks = (0..total_pages).map(|index| process_one(document, model, index, total_pages, config));
    stream::iter(tasks)
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await
}

/// One page at a time, in page order.
async fn process_sequential(
    document: &dyn Document,
    model: &dyn ModelClient,
    total_pages: usize,
    config: &PipelineConfig,
) -> Vec<PageResult> {
    let mut results = Vec::with_capacity(total_pages);
    for index in 0..total_pages {
        results.push(process_one(document, model, index, total_pages, config).await);
    }
    results
}

/// [`transcribe_page`] wrapped with logging and progress events.
async fn process_one(
    document: &dyn Document,
    model: &dyn ModelClient,
    index: usize,
    total_pages: usize,
    config: &PipelineConfig,
) -> PageResult {
    let page_num = index + 1;
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(page_num, total_pages);
    }

    let result = transcribe_page(document, model, index, config).await;

    match &result.error {
        None => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_complete(page_num, total_pages, result.text.len());
            }
        }
        Some(e) => {
            warn!("{}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_error(page_num, total_pages, e.to_string());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_keeps_empty_slots() {
        let pages = vec![
            PageResult::success(0, "uno".into(), 1),
            PageResult::failure(
                1,
                PageError::RenderFailed {
                    page: 2,
                    detail: "x".into(),
                },
                1,
            ),
            PageResult::success(2, "tres".into(), 1),
        ];
        assert_eq!(assemble_pages(&pages), "uno\n\ntres");
    }

    #[test]
    fn assemble_trims_outer_whitespace() {
        let pages = vec![
            PageResult::success(0, "\n  hola".into(), 1),
            PageResult::success(1, "mundo \n".into(), 1),
        ];
        assert_eq!(assemble_pages(&pages), "hola\nmundo");
    }

    #[test]
    fn assemble_empty_document() {
        assert_eq!(assemble_pages(&[]), "");
    }
}
