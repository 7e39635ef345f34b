//! The application state controller.
//!
//! A [`Session`] owns the authoritative narrative string, the reference
//! image, the generation phase and everything derived from them. It is a
//! cheap `Clone` handle over shared state, so a UI, a spawned task and the
//! editor's [`NarrativeWriter`] can all hold one.
//!
//! ## Phase machine
//!
//! ```text
//!            generate (valid)          synthesis ok
//!   Idle ────────────────────▶ Generating ──────────▶ Success
//!    ▲                              │                    │
//!    │                              │ synthesis failed   │
//!    │            reset             ▼                    │
//!    └─────────────────────────── Error ◀────────────────┘ (reset only)
//! ```
//!
//! An invalid `generate` (no visible text, no image) leaves the phase alone
//! and only sets the active message. Analysis never touches the phase.
//!
//! ## Stale results
//!
//! The state lock is never held across an `.await`. Each async operation
//! takes a request id when it starts and compares it with the current one
//! when its result arrives. [`Session::reset`], a newer upload, or
//! [`Session::clear_reference_image`] bump the relevant counter, so the late
//! result is dropped and reported as [`Outcome::Superseded`].

use crate::config::StudioConfig;
use crate::document::{AnalysisReport, GeneratedDocument, ReferenceImage};
use crate::editor::ChangeSink;
use crate::error::DocMimicError;
use crate::export::preview::PreviewRegion;
use crate::export::word::{self, WordPackage};
use crate::messages::MessageKey;
use crate::observer::{NoopObserver, ObserverHandle};
use crate::paper::PaperSize;
use crate::pipeline::intake::{check_declared_type, read_reference_image, IncomingFile};
use crate::pipeline::llm::{analyze_text, synthesize_layout, InferenceBackend, LlmBackend};
use crate::pipeline::postprocess::{has_visible_text, plain_text_len};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress of the generation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Generating,
    Success,
    Error,
}

/// Result of an async operation that may have been overtaken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The result was applied to the session.
    Completed(T),
    /// A newer request, a reset or a clear made the result irrelevant.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            Outcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Outcome::Superseded)
    }
}

/// Handle for one in-flight reference-image read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    id: u64,
    /// The read this one replaced; reinstated if this one turns out not to
    /// be an image.
    replaced: u64,
}

/// Serializable view of a session, for UIs and `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub narrative: String,
    pub narrative_chars: usize,
    pub reference: Option<ReferenceImage>,
    pub generated: Option<GeneratedDocument>,
    pub analysis: Option<AnalysisReport>,
    pub analysis_busy: bool,
    pub message: Option<String>,
    pub paper_size: PaperSize,
    pub full_screen: bool,
}

#[derive(Default)]
struct State {
    narrative: String,
    reference: Option<Arc<ReferenceImage>>,
    phase: SessionPhase,
    generated: Option<Arc<GeneratedDocument>>,
    analysis: Option<Arc<AnalysisReport>>,
    analysis_busy: bool,
    message: Option<String>,
    paper_size: PaperSize,
    full_screen: bool,
    generate_id: u64,
    analysis_id: u64,
    /// The only upload whose read may still be applied.
    upload_id: u64,
    upload_seq: u64,
}

/// Observer events collected under the lock and delivered after it.
enum Event {
    Phase(SessionPhase),
    Message(Option<String>),
    AnalysisStarted,
    AnalysisFinished(bool),
}

impl State {
    fn set_phase(&mut self, phase: SessionPhase, events: &mut Vec<Event>) {
        if self.phase != phase {
            debug!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            events.push(Event::Phase(phase));
        }
    }

    fn set_message(&mut self, message: Option<String>, events: &mut Vec<Event>) {
        if self.message != message {
            self.message = message.clone();
            events.push(Event::Message(message));
        }
    }
}

struct Inner {
    config: StudioConfig,
    backend: Arc<dyn InferenceBackend>,
    observer: ObserverHandle,
    state: Mutex<State>,
}

/// Shared handle to one editing session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(config: StudioConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self::with_observer(config, backend, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        config: StudioConfig,
        backend: Arc<dyn InferenceBackend>,
        observer: ObserverHandle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                backend,
                observer,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Session backed by the configured `edgequake_llm` provider.
    pub fn from_config(config: StudioConfig) -> Self {
        let backend = Arc::new(LlmBackend::new(config.clone()));
        Self::new(config, backend)
    }

    pub fn config(&self) -> &StudioConfig {
        &self.inner.config
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: Vec<Event>) {
        let observer = &self.inner.observer;
        for event in events {
            match event {
                Event::Phase(p) => observer.on_phase_changed(p),
                Event::Message(m) => observer.on_message_changed(m.as_deref()),
                Event::AnalysisStarted => observer.on_analysis_started(),
                Event::AnalysisFinished(ok) => observer.on_analysis_finished(ok),
            }
        }
    }

    fn localized(&self, key: MessageKey) -> String {
        self.inner.config.locale.message(key).to_string()
    }

    // ── Narrative ────────────────────────────────────────────────────────

    pub fn narrative(&self) -> String {
        self.state().narrative.clone()
    }

    /// Replace the whole narrative in one store.
    pub fn replace_narrative(&self, markup: impl Into<String>) {
        self.state().narrative = markup.into();
    }

    /// Visible characters in the narrative (tags stripped).
    pub fn narrative_char_count(&self) -> usize {
        plain_text_len(&self.state().narrative)
    }

    /// A [`ChangeSink`] that writes surface changes into this session.
    pub fn narrative_writer(&self) -> Arc<dyn ChangeSink> {
        Arc::new(NarrativeWriter {
            session: self.clone(),
        })
    }

    // ── Reference image ──────────────────────────────────────────────────

    pub fn reference_image(&self) -> Option<Arc<ReferenceImage>> {
        self.state().reference.clone()
    }

    /// Validate an upload's declared type and start tracking its read.
    ///
    /// A rejected file sets the active message and leaves the current image
    /// and any in-flight read untouched.
    pub fn begin_reference_upload(&self, file: &IncomingFile) -> Result<UploadTicket, DocMimicError> {
        let mut events = Vec::new();
        let result = {
            let mut st = self.state();
            let rejected = file
                .declared_mime
                .as_deref()
                .map(|mime| check_declared_type(&file.name, mime))
                .and_then(Result::err);
            match rejected {
                Some(e) => {
                    warn!("Rejected upload: {}", e);
                    st.set_message(Some(self.localized(MessageKey::NotAnImage)), &mut events);
                    Err(e)
                }
                None => {
                    st.upload_seq += 1;
                    let ticket = UploadTicket {
                        id: st.upload_seq,
                        replaced: st.upload_id,
                    };
                    st.upload_id = ticket.id;
                    Ok(ticket)
                }
            }
        };
        self.emit(events);
        result
    }

    /// Apply the result of a read started with `ticket`, unless a newer
    /// upload or a clear happened in the meantime.
    pub fn finish_reference_upload(
        &self,
        ticket: UploadTicket,
        result: Result<ReferenceImage, DocMimicError>,
    ) -> Result<Outcome<Arc<ReferenceImage>>, DocMimicError> {
        let mut events = Vec::new();
        let outcome = {
            let mut st = self.state();
            if st.upload_id != ticket.id {
                debug!("Discarding stale upload #{} (current #{})", ticket.id, st.upload_id);
                Ok(Outcome::Superseded)
            } else {
                match result {
                    Ok(image) => {
                        info!(
                            "Reference image '{}' ready ({}, {} bytes)",
                            image.file_name,
                            image.mime_type,
                            image.byte_len()
                        );
                        let image = Arc::new(image);
                        st.reference = Some(Arc::clone(&image));
                        st.set_message(None, &mut events);
                        Ok(Outcome::Completed(image))
                    }
                    Err(e) => {
                        if matches!(e, DocMimicError::NotAnImage { .. }) {
                            // Type only known after the read (URLs); the
                            // rejected file must not cancel the earlier read.
                            st.upload_id = ticket.replaced;
                            st.set_message(
                                Some(self.localized(MessageKey::NotAnImage)),
                                &mut events,
                            );
                        }
                        Err(e)
                    }
                }
            }
        };
        self.emit(events);
        outcome
    }

    /// Validate, read and install a reference image.
    pub async fn upload_reference(
        &self,
        file: IncomingFile,
    ) -> Result<Outcome<Arc<ReferenceImage>>, DocMimicError> {
        let ticket = self.begin_reference_upload(&file)?;
        let result = read_reference_image(file, self.inner.config.download_timeout_secs).await;
        self.finish_reference_upload(ticket, result)
    }

    /// Remove the reference image; any in-flight read is discarded.
    pub fn clear_reference_image(&self) {
        let mut st = self.state();
        st.upload_seq += 1;
        st.upload_id = st.upload_seq;
        st.reference = None;
    }

    // ── Generation ───────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    /// False while a generation is in flight; the trigger should be disabled.
    pub fn can_generate(&self) -> bool {
        self.state().phase != SessionPhase::Generating
    }

    pub fn generated(&self) -> Option<Arc<GeneratedDocument>> {
        self.state().generated.clone()
    }

    /// The single active user-facing message, if any.
    pub fn message(&self) -> Option<String> {
        self.state().message.clone()
    }

    /// Synthesize a document from the narrative and the reference image.
    ///
    /// # Errors
    /// - [`DocMimicError::Busy`] if a generation is already running
    /// - [`DocMimicError::EmptyNarrative`] / [`DocMimicError::MissingReferenceImage`]
    ///   on validation failure (phase unchanged)
    /// - [`DocMimicError::Collaborator`] if synthesis failed (phase `Error`)
    pub async fn generate(&self) -> Result<Outcome<Arc<GeneratedDocument>>, DocMimicError> {
        let mut events = Vec::new();
        let prepared = {
            let mut st = self.state();
            if st.phase == SessionPhase::Generating {
                return Err(DocMimicError::Busy);
            }
            if !has_visible_text(&st.narrative) {
                let message = self.localized(MessageKey::EmptyNarrative);
                st.set_message(Some(message.clone()), &mut events);
                Err(DocMimicError::EmptyNarrative { message })
            } else if let Some(reference) = st.reference.clone() {
                st.generate_id += 1;
                st.set_phase(SessionPhase::Generating, &mut events);
                st.set_message(None, &mut events);
                Ok((st.generate_id, st.narrative.clone(), reference))
            } else {
                let message = self.localized(MessageKey::MissingReferenceImage);
                st.set_message(Some(message.clone()), &mut events);
                Err(DocMimicError::MissingReferenceImage { message })
            }
        };
        self.emit(events);
        let (id, narrative, reference) = prepared?;

        info!("Generation #{} started ({} chars of markup)", id, narrative.len());
        let start = Instant::now();
        let result = synthesize_layout(
            self.inner.backend.as_ref(),
            &narrative,
            &reference,
            &self.inner.config,
        )
        .await;

        let mut events = Vec::new();
        let outcome = {
            let mut st = self.state();
            if st.generate_id != id {
                debug!("Discarding superseded generation #{}", id);
                Ok(Outcome::Superseded)
            } else {
                match result {
                    Ok(markup) => {
                        info!("Generation #{} done in {:?}", id, start.elapsed());
                        let doc = Arc::new(GeneratedDocument { markup });
                        st.generated = Some(Arc::clone(&doc));
                        st.set_phase(SessionPhase::Success, &mut events);
                        Ok(Outcome::Completed(doc))
                    }
                    Err(_) => {
                        let message = self.localized(MessageKey::GenerationFailed);
                        st.generated = None;
                        st.full_screen = false;
                        st.set_phase(SessionPhase::Error, &mut events);
                        st.set_message(Some(message.clone()), &mut events);
                        Err(DocMimicError::Collaborator { message })
                    }
                }
            }
        };
        self.emit(events);
        outcome
    }

    /// Back to `Idle`: drops the generated document, the analysis and the
    /// message. Narrative and reference image are kept.
    pub fn reset(&self) {
        let mut events = Vec::new();
        {
            let mut st = self.state();
            st.generate_id += 1;
            st.analysis_id += 1;
            st.generated = None;
            st.analysis = None;
            st.full_screen = false;
            if st.analysis_busy {
                st.analysis_busy = false;
                events.push(Event::AnalysisFinished(false));
            }
            st.set_phase(SessionPhase::Idle, &mut events);
            st.set_message(None, &mut events);
        }
        self.emit(events);
    }

    // ── Analysis ─────────────────────────────────────────────────────────

    pub fn analysis(&self) -> Option<Arc<AnalysisReport>> {
        self.state().analysis.clone()
    }

    pub fn is_analyzing(&self) -> bool {
        self.state().analysis_busy
    }

    /// Hide the analysis report.
    pub fn dismiss_analysis(&self) {
        self.state().analysis = None;
    }

    /// Ask for an editorial review of the narrative.
    ///
    /// Runs independently of generation and never changes the phase.
    pub async fn analyze(&self) -> Result<Outcome<Arc<AnalysisReport>>, DocMimicError> {
        let mut events = Vec::new();
        let prepared = {
            let mut st = self.state();
            if st.analysis_busy {
                return Err(DocMimicError::AnalysisBusy);
            }
            if has_visible_text(&st.narrative) {
                st.analysis_id += 1;
                st.analysis_busy = true;
                st.analysis = None;
                st.set_message(None, &mut events);
                events.push(Event::AnalysisStarted);
                Ok((st.analysis_id, st.narrative.clone()))
            } else {
                let message = self.localized(MessageKey::EmptyAnalysisText);
                st.set_message(Some(message.clone()), &mut events);
                Err(DocMimicError::EmptyAnalysisText { message })
            }
        };
        self.emit(events);
        let (id, narrative) = prepared?;

        let result = analyze_text(self.inner.backend.as_ref(), &narrative, &self.inner.config).await;

        let mut events = Vec::new();
        let outcome = {
            let mut st = self.state();
            if st.analysis_id != id {
                debug!("Discarding superseded analysis #{}", id);
                Ok(Outcome::Superseded)
            } else {
                st.analysis_busy = false;
                match result {
                    Ok(markup) => {
                        let report = Arc::new(AnalysisReport { markup });
                        st.analysis = Some(Arc::clone(&report));
                        events.push(Event::AnalysisFinished(true));
                        Ok(Outcome::Completed(report))
                    }
                    Err(_) => {
                        let message = self.localized(MessageKey::AnalysisFailed);
                        st.set_message(Some(message.clone()), &mut events);
                        events.push(Event::AnalysisFinished(false));
                        Err(DocMimicError::Collaborator { message })
                    }
                }
            }
        };
        self.emit(events);
        outcome
    }

    // ── Presentation state ───────────────────────────────────────────────

    pub fn paper_size(&self) -> PaperSize {
        self.state().paper_size
    }

    pub fn set_paper_size(&self, paper: PaperSize) {
        self.state().paper_size = paper;
    }

    pub fn is_full_screen(&self) -> bool {
        self.state().full_screen
    }

    /// Open the full-screen preview. Only possible with a generated document.
    pub fn open_full_screen(&self) -> bool {
        let mut st = self.state();
        st.full_screen = st.generated.is_some();
        st.full_screen
    }

    /// Close the full-screen preview (the Escape key).
    pub fn close_full_screen(&self) {
        self.state().full_screen = false;
    }

    // ── Export inputs ────────────────────────────────────────────────────

    /// The rendered preview region, present once a document was generated.
    pub fn preview_region(&self) -> Option<PreviewRegion> {
        let st = self.state();
        st.generated
            .as_ref()
            .map(|doc| PreviewRegion::new(&doc.markup, st.paper_size))
    }

    /// Word package for the generated document at the current paper size.
    pub fn word_package(&self) -> Option<WordPackage> {
        let st = self.state();
        st.generated.as_ref().map(|doc| {
            word::build_package(&doc.markup, st.paper_size, &self.inner.config.export_base_name)
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.state();
        SessionSnapshot {
            phase: st.phase,
            narrative: st.narrative.clone(),
            narrative_chars: plain_text_len(&st.narrative),
            reference: st.reference.as_deref().cloned(),
            generated: st.generated.as_deref().cloned(),
            analysis: st.analysis.as_deref().cloned(),
            analysis_busy: st.analysis_busy,
            message: st.message.clone(),
            paper_size: st.paper_size,
            full_screen: st.full_screen,
        }
    }
}

/// Writes editing-surface changes into a [`Session`].
pub struct NarrativeWriter {
    session: Session,
}

impl ChangeSink for NarrativeWriter {
    fn on_change(&self, html: &str) {
        self.session.replace_narrative(html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::messages::Locale;
    use crate::pipeline::llm::InferenceRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct Scripted {
        reply: Result<String, InferenceError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(InferenceError::Unavailable("no key".into())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InferenceBackend for Scripted {
        async fn complete(&self, _request: InferenceRequest) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    /// Blocks every call until released.
    struct Gated {
        gate: Notify,
    }

    #[async_trait]
    impl InferenceBackend for Gated {
        async fn complete(&self, _request: InferenceRequest) -> Result<String, InferenceError> {
            self.gate.notified().await;
            Ok("<p>late</p>".into())
        }
    }

    fn png(name: &str) -> IncomingFile {
        IncomingFile::from_bytes(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    async fn ready_session(backend: Arc<dyn InferenceBackend>) -> Session {
        let s = Session::new(StudioConfig::default(), backend);
        s.replace_narrative("<p>Rapat dimulai pukul 09.00</p>");
        s.upload_reference(png("ref.png")).await.unwrap();
        s
    }

    #[tokio::test]
    async fn empty_narrative_is_rejected_without_phase_change() {
        let backend = Scripted::ok("<p>x</p>");
        let s = Session::new(StudioConfig::default(), backend.clone());
        s.replace_narrative("<p> <br></p>");
        s.upload_reference(png("ref.png")).await.unwrap();

        let err = s.generate().await.unwrap_err();
        assert!(matches!(err, DocMimicError::EmptyNarrative { .. }));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.message().as_deref(), Some("Mohon isi narasi teks terlebih dahulu."));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_image_is_rejected_without_phase_change() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        s.replace_narrative("Halo");
        let err = s.generate().await.unwrap_err();
        assert!(matches!(err, DocMimicError::MissingReferenceImage { .. }));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.message().as_deref(), Some("Mohon upload gambar model referensi."));
    }

    #[tokio::test]
    async fn successful_generation_stores_document() {
        let s = ready_session(Scripted::ok("```html<div>Surat</div>```")).await;
        let doc = s.generate().await.unwrap().completed().unwrap();
        assert_eq!(doc.markup, "<div>Surat</div>");
        assert_eq!(s.phase(), SessionPhase::Success);
        assert!(s.message().is_none());
        assert!(s.preview_region().is_some());
    }

    #[tokio::test]
    async fn collaborator_failure_sets_error_and_generic_message() {
        let config = StudioConfig::builder().locale(Locale::English).build().unwrap();
        let s = Session::new(config, Scripted::failing());
        s.replace_narrative("text");
        s.upload_reference(png("ref.png")).await.unwrap();

        let err = s.generate().await.unwrap_err();
        assert!(matches!(err, DocMimicError::Collaborator { .. }));
        assert_eq!(s.phase(), SessionPhase::Error);
        assert!(s.generated().is_none());
        let msg = s.message().unwrap();
        assert!(msg.starts_with("Something went wrong"), "got: {msg}");
        assert!(!msg.contains("no key"));
    }

    #[tokio::test]
    async fn non_image_upload_keeps_previous_image() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        s.upload_reference(png("first.png")).await.unwrap();

        let pdf = IncomingFile::from_bytes("notes.pdf", "application/pdf", vec![1]);
        let err = s.upload_reference(pdf).await.unwrap_err();
        assert!(matches!(err, DocMimicError::NotAnImage { .. }));
        assert_eq!(s.reference_image().unwrap().file_name, "first.png");
        assert!(s.message().is_some());
    }

    #[tokio::test]
    async fn rejected_file_does_not_supersede_inflight_read() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        let good = png("good.png");
        let ticket = s.begin_reference_upload(&good).unwrap();
        let bad = IncomingFile::from_bytes("a.txt", "text/plain", vec![]);
        assert!(s.begin_reference_upload(&bad).is_err());

        let read = read_reference_image(good, 5).await;
        let out = s.finish_reference_upload(ticket, read).unwrap();
        assert!(!out.is_superseded());
        assert_eq!(s.reference_image().unwrap().file_name, "good.png");
    }

    /// Serves one HTTP response with the given content type, then closes.
    async fn serve_once(content_type: &'static str, body: &'static [u8]) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                content_type,
                body.len()
            );
            sock.write_all(head.as_bytes()).await.unwrap();
            sock.write_all(body).await.unwrap();
            sock.shutdown().await.unwrap();
        });
        format!("http://{addr}/page.html")
    }

    #[tokio::test]
    async fn rejected_url_does_not_supersede_inflight_read() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        let good = png("good.png");
        let ticket = s.begin_reference_upload(&good).unwrap();

        let url = serve_once("text/html; charset=utf-8", b"<html></html>").await;
        let err = s.upload_reference(IncomingFile::from_url(url)).await.unwrap_err();
        assert!(matches!(err, DocMimicError::NotAnImage { .. }), "got {err:?}");
        assert_eq!(s.message().as_deref(), Some("Mohon upload file gambar (JPG, PNG, JPEG)"));

        let read = read_reference_image(good, 5).await;
        let out = s.finish_reference_upload(ticket, read).unwrap();
        assert!(!out.is_superseded());
        assert_eq!(s.reference_image().unwrap().file_name, "good.png");
    }

    #[tokio::test]
    async fn upload_after_rejected_url_still_supersedes() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        let old = png("old.png");
        let old_ticket = s.begin_reference_upload(&old).unwrap();

        let url = serve_once("text/html", b"nope").await;
        assert!(s.upload_reference(IncomingFile::from_url(url)).await.is_err());
        s.upload_reference(png("new.png")).await.unwrap();

        let old_read = read_reference_image(old, 5).await;
        assert!(s.finish_reference_upload(old_ticket, old_read).unwrap().is_superseded());
        assert_eq!(s.reference_image().unwrap().file_name, "new.png");
    }

    #[tokio::test]
    async fn stale_read_never_overwrites_newer_image() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        let old = png("old.png");
        let new = png("new.png");
        let old_ticket = s.begin_reference_upload(&old).unwrap();
        let new_ticket = s.begin_reference_upload(&new).unwrap();

        let new_read = read_reference_image(new, 5).await;
        s.finish_reference_upload(new_ticket, new_read).unwrap();
        let old_read = read_reference_image(old, 5).await;
        let out = s.finish_reference_upload(old_ticket, old_read).unwrap();

        assert!(out.is_superseded());
        assert_eq!(s.reference_image().unwrap().file_name, "new.png");
    }

    #[tokio::test]
    async fn clear_discards_inflight_read() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        let file = png("ref.png");
        let ticket = s.begin_reference_upload(&file).unwrap();
        s.clear_reference_image();
        let read = read_reference_image(file, 5).await;
        assert!(s.finish_reference_upload(ticket, read).unwrap().is_superseded());
        assert!(s.reference_image().is_none());
    }

    #[tokio::test]
    async fn reset_during_generation_discards_result() {
        let backend = Arc::new(Gated { gate: Notify::new() });
        let s = ready_session(backend.clone()).await;

        let task = {
            let s = s.clone();
            tokio::spawn(async move { s.generate().await })
        };
        while s.phase() != SessionPhase::Generating {
            tokio::task::yield_now().await;
        }
        assert!(!s.can_generate());
        assert!(matches!(s.generate().await, Err(DocMimicError::Busy)));

        s.reset();
        backend.gate.notify_one();
        let out = task.await.unwrap().unwrap();

        assert!(out.is_superseded());
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.generated().is_none());
    }

    #[tokio::test]
    async fn reset_keeps_inputs_and_clears_outputs() {
        let s = ready_session(Scripted::ok("<p>doc</p>")).await;
        s.generate().await.unwrap();
        s.analyze().await.unwrap();
        assert!(s.open_full_screen());

        s.reset();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.generated().is_none());
        assert!(s.analysis().is_none());
        assert!(!s.is_full_screen());
        assert!(s.reference_image().is_some());
        assert!(!s.narrative().is_empty());
    }

    #[tokio::test]
    async fn analysis_does_not_touch_phase() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("<ul><li>ok</li></ul>"));
        s.replace_narrative("<p>kalimat</p>");
        let report = s.analyze().await.unwrap().completed().unwrap();
        assert_eq!(report.markup, "<ul><li>ok</li></ul>");
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(!s.is_analyzing());

        s.dismiss_analysis();
        assert!(s.analysis().is_none());
    }

    #[tokio::test]
    async fn concurrent_analysis_is_refused_with_its_own_error() {
        let backend = Arc::new(Gated { gate: Notify::new() });
        let s = Session::new(StudioConfig::default(), backend.clone());
        s.replace_narrative("<p>kalimat panjang</p>");

        let task = {
            let s = s.clone();
            tokio::spawn(async move { s.analyze().await })
        };
        while !s.is_analyzing() {
            tokio::task::yield_now().await;
        }
        let err = s.analyze().await.unwrap_err();
        assert!(matches!(err, DocMimicError::AnalysisBusy));
        assert_ne!(err.to_string(), DocMimicError::Busy.to_string());
        assert_eq!(s.phase(), SessionPhase::Idle);

        backend.gate.notify_one();
        assert!(!task.await.unwrap().unwrap().is_superseded());
        assert!(!s.is_analyzing());
    }

    #[tokio::test]
    async fn analysis_failure_only_sets_message() {
        let s = Session::new(StudioConfig::default(), Scripted::failing());
        s.replace_narrative("teks");
        let err = s.analyze().await.unwrap_err();
        assert!(matches!(err, DocMimicError::Collaborator { .. }));
        assert_eq!(s.message().as_deref(), Some("Gagal menganalisa teks."));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(!s.is_analyzing());
    }

    #[tokio::test]
    async fn empty_analysis_text_is_rejected() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        let err = s.analyze().await.unwrap_err();
        assert!(matches!(err, DocMimicError::EmptyAnalysisText { .. }));
        assert_eq!(s.message().as_deref(), Some("Mohon isi narasi teks untuk dianalisa."));
    }

    #[test]
    fn full_screen_requires_document() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        assert!(!s.open_full_screen());
        assert!(!s.is_full_screen());
        assert!(s.word_package().is_none());
    }

    #[test]
    fn writer_updates_narrative_and_char_count() {
        let s = Session::new(StudioConfig::default(), Scripted::ok("x"));
        s.narrative_writer().on_change("<b>Halo</b> dunia");
        assert_eq!(s.narrative(), "<b>Halo</b> dunia");
        assert_eq!(s.narrative_char_count(), 10);
    }

    #[tokio::test]
    async fn snapshot_serializes() {
        let s = ready_session(Scripted::ok("<p>doc</p>")).await;
        s.set_paper_size(PaperSize::Legal);
        s.generate().await.unwrap();
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["phase"], "Success");
        assert_eq!(json["paper_size"], "Legal");
        assert_eq!(json["generated"]["markup"], "<p>doc</p>");
        assert_eq!(json["reference"]["file_name"], "ref.png");
    }
}
