//! # docmimic
//!
//! Turn free-form narrative text into a document that mimics the layout of
//! a reference image, then export it to Word or PDF.
//!
//! ## Why this crate?
//!
//! Office paperwork (letters, minutes, decrees) follows rigid visual
//! templates: letterheads, numbered clauses, signature tables. Writing the
//! content is easy; reproducing the layout is tedious. This crate sends the
//! narrative together with a picture of an existing document to a
//! vision-capable LLM, gets back Word-compatible HTML that follows the
//! picture's structure, and packages it with the right page geometry.
//!
//! ## Pipeline Overview
//!
//! ```text
//! narrative ──▶ Synchronizer ──▶ Session ◀── reference image (intake)
//!                                   │
//!                                   ├─ generate ──▶ VLM ──▶ GeneratedDocument
//!                                   ├─ analyze  ──▶ LLM ──▶ AnalysisReport
//!                                   │
//!                                   └─ export ──▶ Word envelope (.doc)
//!                                               └▶ rasterised PDF (.pdf)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docmimic::{IncomingFile, Session, StudioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let session = Session::from_config(StudioConfig::default());
//!     session.replace_narrative("<p>Rapat dibuka pukul 09.00 oleh ketua.</p>");
//!     session.upload_reference(IncomingFile::from_path("template.png")).await?;
//!     session.generate().await?;
//!
//!     if let Some(package) = session.word_package() {
//!         docmimic::export::save_artifact(".".as_ref(), &package.file_name, &package.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docmimic` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docmimic = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod messages;
pub mod observer;
pub mod paper;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{StudioConfig, StudioConfigBuilder, DEFAULT_EXPORT_BASE_NAME, DEFAULT_MODEL};
pub use document::{AnalysisReport, GeneratedDocument, ReferenceImage};
pub use editor::{
    ChangeSink, EditingSurface, FormatCommand, HeadlessSurface, RenderOutcome, SyncPolicy,
    Synchronizer,
};
pub use error::{DocMimicError, InferenceError};
pub use export::pdf::{PdfExporter, PdfOptions, PdfOutcome, PdfPackage, RegionRasterizer};
pub use export::preview::PreviewRegion;
pub use export::word::{build_envelope, WordPackage};
pub use messages::{Locale, MessageKey};
pub use observer::{NoopObserver, SessionObserver};
pub use paper::PaperSize;
pub use pipeline::intake::IncomingFile;
pub use pipeline::llm::{InferenceBackend, InferenceRequest, LlmBackend};
pub use session::{NarrativeWriter, Outcome, Session, SessionPhase, SessionSnapshot, UploadTicket};
