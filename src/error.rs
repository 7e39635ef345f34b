//! Error types for the docmimic library.
//!
//! Two distinct error types reflect two distinct audiences:
//!
//! * [`DocMimicError`]: everything a caller (and ultimately the end user)
//!   can observe. Validation failures, intake problems, collaborator
//!   failures and export preconditions all land here. None of them is fatal
//!   to the process: every path returns the session to an interactive state.
//!
//! * [`InferenceError`]: the detailed cause of a failed LLM call. It is
//!   logged at the call boundary and then collapsed into the generic
//!   [`DocMimicError::Collaborator`]; the end user never sees it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docmimic library.
#[derive(Debug, Error)]
pub enum DocMimicError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Generation requested with a narrative that has no visible text.
    #[error("{message}")]
    EmptyNarrative { message: String },

    /// Generation requested before a reference image was uploaded.
    #[error("{message}")]
    MissingReferenceImage { message: String },

    /// Analysis requested with a narrative that has no visible text.
    #[error("{message}")]
    EmptyAnalysisText { message: String },

    /// The declared media type of an upload is not `image/*`.
    #[error("'{name}' is not an image (declared type: '{mime}')")]
    NotAnImage { name: String, mime: String },

    // ── Intake errors ─────────────────────────────────────────────────────
    /// Reference image file was not found at the given path.
    #[error("Reference image not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Reference image URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The inference service failed. The message is the generic localized
    /// text shown to the user; the cause was logged where it happened.
    #[error("{message}")]
    Collaborator { message: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// A generation request is already in flight.
    #[error("A document is already being generated")]
    Busy,

    /// An analysis request is already in flight.
    #[error("The narrative is already being analyzed")]
    AnalysisBusy,

    // ── Export errors ─────────────────────────────────────────────────────
    /// No rasterising backend is available for PDF export.
    #[error("{message}")]
    RendererUnavailable { message: String },

    /// A PDF export is still pending.
    #[error("A PDF export is already running")]
    ExportAlreadyRunning,

    /// The rasterising backend failed on the preview region.
    #[error("Rasterisation of '{region}' failed: {detail}")]
    RasterisationFailed { region: String, detail: String },

    /// Building the PDF document failed.
    #[error("PDF encoding failed: {0}")]
    PdfEncodingFailed(String),

    /// Could not create or write an exported artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocMimicError {
    /// True for errors detected locally before any external call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DocMimicError::EmptyNarrative { .. }
                | DocMimicError::MissingReferenceImage { .. }
                | DocMimicError::EmptyAnalysisText { .. }
                | DocMimicError::NotAnImage { .. }
        )
    }
}

/// Detailed cause of a failed inference call. Logged, never shown.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// No credential or provider could be resolved.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured timeout.
    #[error("call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),
}
