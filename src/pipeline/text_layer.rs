//! Native text-layer extraction.

use crate::pipeline::document::Document;
use tracing::{debug, error, warn};

/// Concatenate the embedded text of every page, in page order.
///
/// Each non-empty page is followed by a newline and the whole result is
/// trimmed. Pages whose text layer cannot be read are skipped with a warning.
/// A document that cannot be opened at all yields an empty string, which the
/// caller treats as "no text layer" and answers with OCR.
pub async fn extract_text_layer(document: &dyn Document) -> String {
    let pages = match document.text_layer().await {
        Ok(pages) => pages,
        Err(e) => {
            error!("Text layer unavailable: {}", e);
            return String::new();
        }
    };

    let mut text = String::new();
    for page in pages {
        match page {
            Ok(page_text) if !page_text.is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => {}
            Err(e) => warn!("{}", e),
        }
    }

    let text = text.trim().to_string();
    debug!("Text layer yielded {} bytes", text.len());
    text
}
