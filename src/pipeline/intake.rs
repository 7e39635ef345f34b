//! Reference-image intake: validate the declared type, read the bytes and
//! wrap them as a [`ReferenceImage`].
//!
//! The declared media type is checked *before* anything is read so a
//! rejected upload never disturbs the session's current image. Reading is
//! asynchronous; the session pairs each read with an upload ticket and drops
//! results that arrive after the upload was replaced or cleared.

use crate::document::ReferenceImage;
use crate::error::DocMimicError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the bytes of an upload come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Bytes already in memory (e.g. handed over by a UI layer).
    Bytes(Vec<u8>),
    /// A local file.
    Path(PathBuf),
    /// An HTTP/HTTPS URL; the server's `Content-Type` is the declared type.
    Url(String),
}

/// A single user-supplied file, not yet read.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// Declared media type. `None` only for URLs, where the server declares it.
    pub declared_mime: Option<String>,
    pub source: ImageSource,
}

impl IncomingFile {
    pub fn from_bytes(
        name: impl Into<String>,
        declared_mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_mime: Some(declared_mime.into()),
            source: ImageSource::Bytes(bytes),
        }
    }

    /// A local file whose declared type is derived from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            declared_mime: Some(mime_from_extension(path)),
            source: ImageSource::Path(path.to_path_buf()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: file_name_from_url(&url),
            declared_mime: None,
            source: ImageSource::Url(url),
        }
    }

    /// Dispatch on the input string: URLs are downloaded, anything else is a path.
    pub fn from_input(input: &str) -> Self {
        if is_url(input) {
            Self::from_url(input)
        } else {
            Self::from_path(input)
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Declared media type for a path, from its extension.
fn mime_from_extension(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "reference-image".to_string()
}

/// Reject anything whose declared type is not `image/*`.
///
/// MIME type names are case-insensitive.
pub fn check_declared_type(name: &str, mime: &str) -> Result<(), DocMimicError> {
    if mime.trim().to_ascii_lowercase().starts_with("image/") {
        Ok(())
    } else {
        Err(DocMimicError::NotAnImage {
            name: name.to_string(),
            mime: mime.to_string(),
        })
    }
}

/// Base64-encode raw bytes for the multimodal request body.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Read an upload and produce its [`ReferenceImage`].
///
/// The declared type is validated first (for URLs, as soon as the response
/// headers arrive).
pub async fn read_reference_image(
    file: IncomingFile,
    download_timeout_secs: u64,
) -> Result<ReferenceImage, DocMimicError> {
    if let Some(ref mime) = file.declared_mime {
        check_declared_type(&file.name, mime)?;
    }

    let (raw_bytes, mime_type) = match file.source {
        ImageSource::Bytes(bytes) => (bytes, file.declared_mime.unwrap_or_default()),
        ImageSource::Path(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                debug!("Failed to read {}: {}", path.display(), e);
                DocMimicError::FileNotFound { path: path.clone() }
            })?;
            (bytes, file.declared_mime.unwrap_or_default())
        }
        ImageSource::Url(url) => download_image(&url, &file.name, download_timeout_secs).await?,
    };

    let encoded_payload = encode_payload(&raw_bytes);
    debug!(
        "Encoded reference image '{}' → {} bytes base64",
        file.name,
        encoded_payload.len()
    );

    Ok(ReferenceImage {
        file_name: file.name,
        raw_bytes,
        encoded_payload,
        mime_type,
    })
}

/// Download an image, returning its bytes and the server-declared type.
async fn download_image(
    url: &str,
    name: &str,
    timeout_secs: u64,
) -> Result<(Vec<u8>, String), DocMimicError> {
    info!("Downloading reference image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocMimicError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocMimicError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocMimicError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocMimicError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_string())
        .unwrap_or_default();
    check_declared_type(name, &mime)?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocMimicError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes ({})", bytes.len(), mime);
    Ok((bytes.to_vec(), mime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/ref.png"));
        assert!(is_url("http://example.com/ref.png"));
        assert!(!is_url("/tmp/ref.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn declared_type_check() {
        assert!(check_declared_type("a.png", "image/png").is_ok());
        assert!(check_declared_type("a.svg", "image/svg+xml").is_ok());
        let err = check_declared_type("a.pdf", "application/pdf").unwrap_err();
        assert!(matches!(err, DocMimicError::NotAnImage { .. }));
    }

    #[test]
    fn declared_type_check_ignores_case() {
        assert!(check_declared_type("a.png", "Image/PNG").is_ok());
        assert!(check_declared_type("a.jpg", "IMAGE/jpeg").is_ok());
        assert!(check_declared_type("a.html", "Text/HTML").is_err());
    }

    #[test]
    fn path_mime_from_extension() {
        assert_eq!(IncomingFile::from_path("/x/ref.PNG").declared_mime.as_deref(), Some("image/png"));
        assert_eq!(IncomingFile::from_path("scan.jpg").declared_mime.as_deref(), Some("image/jpeg"));
        assert_eq!(
            IncomingFile::from_path("notes.txt").declared_mime.as_deref(),
            Some("application/octet-stream")
        );
    }

    #[test]
    fn url_name_is_last_segment() {
        let f = IncomingFile::from_input("https://example.com/a/letter.png");
        assert_eq!(f.name, "letter.png");
        assert!(f.declared_mime.is_none());
    }

    #[tokio::test]
    async fn reads_bytes_and_encodes() {
        let file = IncomingFile::from_bytes("ref.png", "image/png", vec![1, 2, 3]);
        let img = read_reference_image(file, 5).await.unwrap();
        assert_eq!(img.encoded_payload, "AQID");
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(img.byte_len(), 3);
    }

    #[tokio::test]
    async fn rejects_before_reading() {
        let file = IncomingFile::from_path("/definitely/not/here.txt");
        let err = read_reference_image(file, 5).await.unwrap_err();
        assert!(matches!(err, DocMimicError::NotAnImage { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let file = IncomingFile::from_path("/definitely/not/here.png");
        let err = read_reference_image(file, 5).await.unwrap_err();
        assert!(matches!(err, DocMimicError::FileNotFound { .. }), "got {err:?}");
    }
}
