//! Input resolution: turn a user-supplied path or URL into a [`Document`].
//!
//! Both sources are read fully into memory, since the whole file is
//! attached to a single request anyway. The `%PDF` magic bytes are checked
//! before returning, so a wrong file fails here with a clear error instead of
//! as an opaque upstream rejection.

use crate::error::AnalysisError;
use crate::pipeline::request::Document;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` (local path or HTTP/HTTPS URL) to a PDF document.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Document, AnalysisError> {
    let input = input.trim();
    if input.is_empty() || (input.contains("://") && !is_url(input)) {
        return Err(AnalysisError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<Document, AnalysisError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(AnalysisError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalysisError::FileNotFound { path }),
    };
    check_magic(&bytes, &path)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    Ok(Document::new(bytes).with_name(name))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, AnalysisError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| AnalysisError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AnalysisError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    check_magic(&bytes, Path::new(url))?;

    info!("Downloaded {} bytes", bytes.len());
    let mut document = Document::new(bytes.to_vec()).with_name(filename_from_url(url));
    // Servers often label PDFs as octet-stream; only keep a PDF-ish type.
    if let Some(mt) = media_type.filter(|mt| mt.contains("pdf")) {
        document = document.with_media_type(mt);
    }
    Ok(document)
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), AnalysisError> {
    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(AnalysisError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_taken_from_last_segment() {
        assert_eq!(filename_from_url("https://x.test/a/contract.pdf?v=2"), "contract.pdf");
        assert_eq!(filename_from_url("https://x.test/download"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn local_pdf_is_read_with_its_name() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.7\n%fake").unwrap();
        let doc = resolve_input(file.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(&*doc.bytes, b"%PDF-1.7\n%fake");
        assert!(doc.name.unwrap().ends_with(".pdf"));
        assert_eq!(doc.media_type, None);
    }

    #[tokio::test]
    async fn non_pdf_rejected_by_magic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK\x03\x04zip").unwrap();
        let err = resolve_input(file.path().to_str().unwrap(), 5).await.unwrap_err();
        match err {
            AnalysisError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_and_bad_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            resolve_input(missing.to_str().unwrap(), 5).await,
            Err(AnalysisError::FileNotFound { .. })
        ));
        assert!(matches!(
            resolve_input("ftp://example.com/doc.pdf", 5).await,
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            resolve_input("   ", 5).await,
            Err(AnalysisError::InvalidInput { .. })
        ));
    }
}
