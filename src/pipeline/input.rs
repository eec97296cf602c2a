//! Input staging: turn a path, a URL or uploaded bytes into a file on disk.
//!
//! pdfium opens documents by path, so every input ends up as a local file.
//! Downloads and uploads live in temporary storage owned by the returned
//! [`ResolvedInput`]; dropping it deletes the copy on every path out of a
//! request, including errors and panics.
//!
//! The content is not sniffed for `%PDF`. A file pdfium cannot open yields
//! empty text downstream, which is the same outcome a corrupt PDF gets.

use crate::error::CvError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

/// A document ready to be opened by path.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the body sits in a temporary directory.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was an upload; the bytes sit in a self-deleting temporary file.
    Uploaded { path: PathBuf, _file: NamedTempFile },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Uploaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a CLI-style input: an HTTP(S) URL is downloaded, anything else is
/// treated as a local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, CvError> {
    if input.trim().is_empty() {
        return Err(CvError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write uploaded bytes to a temporary file.
///
/// The file keeps the extension of `file_name` (if any) so it is
/// recognisable while it exists; it is removed when the result is dropped.
pub fn stage_upload(bytes: &[u8], file_name: Option<&str>) -> Result<ResolvedInput, CvError> {
    let suffix = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| ".pdf".to_string());

    let mut file = tempfile::Builder::new()
        .prefix("cv-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|source| CvError::Staging { source })?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|source| CvError::Staging { source })?;

    let path = file.path().to_path_buf();
    debug!("Staged upload ({} bytes) at {}", bytes.len(), path.display());
    Ok(ResolvedInput::Uploaded { path, _file: file })
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, CvError> {
    let path = PathBuf::from(path_str);

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CvError::PermissionDenied { path });
        }
        Err(_) => return Err(CvError::FileNotFound { path }),
    }
    if path.is_dir() {
        return Err(CvError::InvalidInput {
            input: path_str.to_string(),
        });
    }

    debug!("Resolved local document: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, CvError> {
    info!("Downloading document from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| CvError::InvalidInput {
        input: url.to_string(),
    })?;

    let failed = |reason: String| CvError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            CvError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(parsed.clone()).send().await.map_err(classify)?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    let bytes = response.bytes().await.map_err(classify)?;

    let temp_dir = TempDir::new().map_err(|source| CvError::Staging { source })?;
    let file_path = temp_dir.path().join(filename_from_url(&parsed));
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|source| CvError::Staging { source })?;

    info!("Downloaded {} bytes to {}", bytes.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment when it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty() && last.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_urls() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.pdf"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url("cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_taken_from_last_segment() {
        let url = reqwest::Url::parse("https://example.com/files/ana_cv.pdf?dl=1").unwrap();
        assert_eq!(filename_from_url(&url), "ana_cv.pdf");

        let url = reqwest::Url::parse("https://example.com/files/").unwrap();
        assert_eq!(filename_from_url(&url), "downloaded.pdf");
    }

    #[tokio::test]
    async fn missing_local_file_is_reported() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, CvError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn blank_input_is_invalid() {
        let err = resolve_input("   ", 5).await.unwrap_err();
        assert!(matches!(err, CvError::InvalidInput { .. }));
    }

    #[test]
    fn staged_upload_is_removed_on_drop() {
        let staged = stage_upload(b"%PDF-1.4 fake", Some("Ana CV.PDF")).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 fake");

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn staged_upload_without_name_defaults_to_pdf() {
        let staged = stage_upload(b"", None).unwrap();
        assert!(staged.path().to_string_lossy().ends_with(".pdf"));
    }
}
