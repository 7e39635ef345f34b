//! Immutable value objects held by a session.
//!
//! Each is created once and replaced wholesale; the session shares them via
//! `Arc` so presentation and export code reference rather than copy them.

use serde::Serialize;

/// An uploaded reference image whose layout the output should mimic.
#[derive(Clone, Serialize)]
pub struct ReferenceImage {
    /// Original file name (or the last URL segment).
    pub file_name: String,
    /// Raw file bytes.
    #[serde(skip)]
    pub raw_bytes: Vec<u8>,
    /// Standard base64 of `raw_bytes`, without any data-URL prefix.
    #[serde(skip)]
    pub encoded_payload: String,
    /// Declared media type, always `image/*`.
    pub mime_type: String,
}

impl ReferenceImage {
    /// Data URL suitable for an `<img src>` preview.
    pub fn displayable_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.encoded_payload)
    }

    pub fn byte_len(&self) -> usize {
        self.raw_bytes.len()
    }
}

impl std::fmt::Debug for ReferenceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.raw_bytes.len())
            .finish()
    }
}

/// Markup produced by layout synthesis. Fences already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    pub markup: String,
}

/// Advisory markup produced by prose analysis. Fences already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub markup: String,
}
