//! Localized user-facing messages.
//!
//! Every message the end user can see lives here, keyed by [`Locale`].
//! Collaborator failures deliberately map to one generic line per operation;
//! the underlying cause is only ever logged.

use serde::{Deserialize, Serialize};

/// Language of user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Bahasa Indonesia (default).
    #[default]
    Indonesian,
    English,
}

/// The kinds of message the session and exporters can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    EmptyNarrative,
    MissingReferenceImage,
    EmptyAnalysisText,
    NotAnImage,
    GenerationFailed,
    AnalysisFailed,
    RendererUnavailable,
}

impl Locale {
    pub fn message(self, key: MessageKey) -> &'static str {
        use MessageKey::*;
        match self {
            Locale::Indonesian => match key {
                EmptyNarrative => "Mohon isi narasi teks terlebih dahulu.",
                MissingReferenceImage => "Mohon upload gambar model referensi.",
                EmptyAnalysisText => "Mohon isi narasi teks untuk dianalisa.",
                NotAnImage => "Mohon upload file gambar (JPG, PNG, JPEG)",
                GenerationFailed => {
                    "Terjadi kesalahan saat memproses. Pastikan API Key valid atau coba lagi nanti."
                }
                AnalysisFailed => "Gagal menganalisa teks.",
                RendererUnavailable => {
                    "Pustaka PDF belum siap. Silakan coba lagi sebentar lagi."
                }
            },
            Locale::English => match key {
                EmptyNarrative => "Please enter the narrative text first.",
                MissingReferenceImage => "Please upload a reference layout image.",
                EmptyAnalysisText => "Please enter narrative text to analyze.",
                NotAnImage => "Please upload an image file (JPG, PNG, JPEG)",
                GenerationFailed => {
                    "Something went wrong while processing. Check that the API key is valid or try again later."
                }
                AnalysisFailed => "Failed to analyze the text.",
                RendererUnavailable => "PDF library is loading. Please try again in a moment.",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [MessageKey; 7] = [
        MessageKey::EmptyNarrative,
        MessageKey::MissingReferenceImage,
        MessageKey::EmptyAnalysisText,
        MessageKey::NotAnImage,
        MessageKey::GenerationFailed,
        MessageKey::AnalysisFailed,
        MessageKey::RendererUnavailable,
    ];

    #[test]
    fn every_key_has_text_in_every_locale() {
        for locale in [Locale::Indonesian, Locale::English] {
            for key in KEYS {
                assert!(!locale.message(key).is_empty(), "{locale:?}/{key:?}");
            }
        }
    }

    #[test]
    fn default_locale_is_indonesian() {
        assert_eq!(
            Locale::default().message(MessageKey::AnalysisFailed),
            "Gagal menganalisa teks."
        );
    }
}
