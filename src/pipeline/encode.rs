//! Image encoding: rendered page → base64 PNG wrapped in `ImageData`.
//!
//! The alpha channel pdfium renders is dropped first; a resume page is opaque
//! and RGB PNGs are about a quarter smaller than RGBA ones.

use crate::error::PageError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode page `index` (0-based) for a vision-model request.
pub fn encode_page(index: usize, img: &DynamicImage) -> Result<ImageData, PageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PageError::EncodeFailed {
            page: index + 1,
            detail: e.to_string(),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page {} → {} bytes base64", index + 1, b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
