//! Document access: page count, per-page text layer, per-page raster.
//!
//! The pipeline only talks to the [`Document`] trait, so extraction policy can
//! be exercised against in-memory documents in tests. [`PdfDocument`] is the
//! production implementation over pdfium.
//!
//! ## Why spawn_blocking and a global lock?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and keeps
//! process-global state. Every pdfium call runs on the blocking pool so the
//! async workers never stall, and a process-wide lock serialises those calls
//! because pdfium cannot be initialised or used from two threads at once.
//! OCR still runs concurrently: only rendering is serialised, and it is cheap
//! next to the vision-model round trip.

use crate::error::{CvError, PageError};
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use pdfium_render::prelude::PdfDocument as PdfiumDocument;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// A multi-page document owned by the pipeline for one request.
#[async_trait]
pub trait Document: Send + Sync {
    /// Number of pages. Fails when the document cannot be opened.
    async fn page_count(&self) -> Result<usize, CvError>;

    /// Every page's embedded text, in page order.
    ///
    /// The outer error means the document could not be opened; inner errors
    /// are pages whose text layer could not be read.
    async fn text_layer(&self) -> Result<Vec<Result<String, PageError>>, CvError>;

    /// Rasterise one page (0-based), capping the longest edge at `max_pixels`.
    async fn render_page(&self, index: usize, max_pixels: u32) -> Result<DynamicImage, PageError>;
}

/// A PDF on disk, read through pdfium.
///
/// Holding this value does not keep the file open: each operation opens the
/// document for the duration of one blocking call.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    path: PathBuf,
    password: Option<String>,
    library: Option<PathBuf>,
}

impl PdfDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: None,
            library: None,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Bind to the pdfium library at `library` instead of the default lookup.
    pub fn with_library(mut self, library: Option<PathBuf>) -> Self {
        self.library = library;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the opened document on the blocking pool.
    async fn with_document<T, F>(&self, f: F) -> Result<T, CvError>
    where
        T: Send + 'static,
        F: FnOnce(&PdfiumDocument<'_>) -> T + Send + 'static,
    {
        let path = self.path.clone();
        let password = self.password.clone();
        let library = self.library.clone();

        tokio::task::spawn_blocking(move || -> Result<T, CvError> {
            let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let pdfium = bind_pdfium(library.as_deref())?;
            let document = pdfium
                .load_pdf_from_file(&path, password.as_deref())
                .map_err(|e| CvError::DocumentOpen {
                    path: path.clone(),
                    detail: format!("{:?}", e),
                })?;
            Ok(f(&document))
        })
        .await
        .map_err(|e| CvError::Internal(format!("pdfium task panicked: {}", e)))?
    }
}

#[async_trait]
impl Document for PdfDocument {
    async fn page_count(&self) -> Result<usize, CvError> {
        let count = self.with_document(|doc| doc.pages().len() as usize).await?;
        info!("PDF loaded: {} pages", count);
        Ok(count)
    }

    async fn text_layer(&self) -> Result<Vec<Result<String, PageError>>, CvError> {
        self.with_document(|doc| {
            let pages = doc.pages();
            (0..pages.len())
                .map(|idx| -> Result<String, PageError> {
                    let detail = |e: PdfiumError| PageError::TextUnreadable {
                        page: idx as usize + 1,
                        detail: format!("{:?}", e),
                    };
                    let page = pages.get(idx).map_err(detail)?;
                    let text = page.text().map_err(detail)?;
                    Ok(text.all())
                })
                .collect()
        })
        .await
    }

    async fn render_page(&self, index: usize, max_pixels: u32) -> Result<DynamicImage, PageError> {
        let rendered = self
            .with_document(move |doc| render_blocking(doc, index, max_pixels))
            .await;

        match rendered {
            Ok(page) => page,
            Err(e) => Err(PageError::RenderFailed {
                page: index + 1,
                detail: e.to_string(),
            }),
        }
    }
}

/// Blocking implementation of single-page rendering.
fn render_blocking(
    document: &PdfiumDocument<'_>,
    index: usize,
    max_pixels: u32,
) -> Result<DynamicImage, PageError> {
    let pages = document.pages();
    let total = pages.len() as usize;
    let failed = |detail: String| PageError::RenderFailed {
        page: index + 1,
        detail,
    };

    if index >= total {
        return Err(failed(format!("page index {} out of range (total={})", index, total)));
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages
        .get(index as u16)
        .map_err(|e| failed(format!("{:?}", e)))?;
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Bind to pdfium: an explicit library path, else the working directory,
/// else the system library path.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, CvError> {
    let bindings = match library {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| CvError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_password_and_library() {
        let doc = PdfDocument::new("/tmp/cv.pdf")
            .with_password(Some("secret".into()))
            .with_library(Some(PathBuf::from("/opt/pdfium/libpdfium.so")));
        assert_eq!(doc.path(), Path::new("/tmp/cv.pdf"));
        assert_eq!(doc.password.as_deref(), Some("secret"));
        assert!(doc.library.is_some());
    }
}
