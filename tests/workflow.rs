//! Integration tests for the full editing → generation → export workflow.
//!
//! The inference service is replaced by a scripted backend and HTML
//! rasterisation by a fixed-size fake, so these run offline.

use async_trait::async_trait;
use docmimic::export::save_artifact;
use docmimic::{
    ChangeSink, DocMimicError, EditingSurface, FormatCommand, HeadlessSurface, IncomingFile,
    InferenceBackend, InferenceError, InferenceRequest, PaperSize, PdfExporter, PdfOutcome,
    PreviewRegion, RegionRasterizer, RenderOutcome, Session, SessionObserver, SessionPhase,
    StudioConfig, SyncPolicy, Synchronizer,
};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::{Arc, Mutex};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Answers layout requests (with image) and analysis requests (without).
struct ScriptedBackend {
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn complete(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        let reply = if request.image.is_some() {
            "```html\n<table><tr><td><b>NOTULEN RAPAT</b></td></tr></table><p>Isi rapat.</p>\n```"
        } else {
            "<ul><li>Kalimat kedua terlalu panjang.</li></ul>"
        };
        self.requests.lock().unwrap().push(request);
        Ok(reply.to_string())
    }
}

/// Rasterises any region to a fixed-size white image.
struct FakeRasterizer {
    width: u32,
    height: u32,
}

#[async_trait]
impl RegionRasterizer for FakeRasterizer {
    async fn rasterize(&self, _region: &PreviewRegion, _scale: f32) -> Result<DynamicImage, DocMimicError> {
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([255, 255, 255]),
        )))
    }
}

#[derive(Default)]
struct PhaseLog(Mutex<Vec<SessionPhase>>);

impl SessionObserver for PhaseLog {
    fn on_phase_changed(&self, phase: SessionPhase) {
        self.0.lock().unwrap().push(phase);
    }
}

fn reference_png() -> IncomingFile {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    IncomingFile::from_bytes("template.png", "image/png", bytes)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_generate_and_export_both_formats() {
    let backend = ScriptedBackend::new();
    let log = Arc::new(PhaseLog::default());
    let session = Session::with_observer(StudioConfig::default(), backend.clone(), log.clone());
    session.set_paper_size(PaperSize::A4);

    let mut editor = Synchronizer::mount(
        HeadlessSurface::new(),
        &session.narrative(),
        session.narrative_writer(),
        SyncPolicy::ForceExternal,
    );
    editor.surface_mut().focus();
    editor.surface_mut().type_text("Rapat dibuka pukul 09.00");
    editor.handle_input();
    editor.surface_mut().select(0..5);
    editor.format(FormatCommand::Bold);
    assert_eq!(session.narrative(), "<b>Rapat</b> dibuka pukul 09.00");

    session.upload_reference(reference_png()).await.unwrap();
    let doc = session.generate().await.unwrap().completed().unwrap();
    assert!(doc.markup.starts_with("\n<table>"));
    assert!(!doc.markup.contains("```"));
    assert_eq!(
        *log.0.lock().unwrap(),
        vec![SessionPhase::Generating, SessionPhase::Success]
    );

    let sent = backend.requests.lock().unwrap();
    assert!(sent[0].user_text.contains("<b>Rapat</b> dibuka pukul 09.00"));
    drop(sent);

    let out = tempfile::tempdir().unwrap();

    let word = session.word_package().unwrap();
    let word_path = save_artifact(out.path(), &word.file_name, &word.bytes).unwrap();
    let saved = std::fs::read_to_string(&word_path).unwrap();
    assert!(word_path.ends_with("dokumen-tersusun.doc"));
    assert!(saved.contains("size: 21cm 29.7cm;"));
    assert!(saved.contains(&doc.markup));

    let exporter = PdfExporter::new(
        session.config(),
        Some(Arc::new(FakeRasterizer {
            width: 832,
            height: 3000,
        })),
    );
    let region = session.preview_region();
    let PdfOutcome::Rendered(pdf) = exporter.export(region.as_ref()).await.unwrap() else {
        panic!("expected a rendered PDF");
    };
    let pdf_path = save_artifact(out.path(), &pdf.file_name, &pdf.bytes).unwrap();
    let reloaded = lopdf::Document::load(&pdf_path).unwrap();
    // 1180 rows per A4 page at 4 px/mm
    assert_eq!(reloaded.get_pages().len(), 3);
}

#[tokio::test]
async fn pdf_export_before_generation_is_a_noop() {
    let session = Session::new(StudioConfig::default(), ScriptedBackend::new());
    let exporter = PdfExporter::new(
        session.config(),
        Some(Arc::new(FakeRasterizer { width: 10, height: 10 })),
    );
    let out = exporter.export(session.preview_region().as_ref()).await.unwrap();
    assert!(matches!(out, PdfOutcome::Skipped));
}

#[tokio::test]
async fn focused_echo_keeps_caret_through_session_round_trip() {
    let session = Session::new(StudioConfig::default(), ScriptedBackend::new());
    let mut editor = Synchronizer::mount(
        HeadlessSurface::new(),
        "",
        session.narrative_writer(),
        SyncPolicy::DeferWhileFocused,
    );
    editor.surface_mut().focus();

    for word in ["Surat ", "keputusan ", "kepala ", "dinas"] {
        editor.surface_mut().type_text(word);
        editor.handle_input();
        let caret = editor.surface().caret();
        editor.render(&session.narrative());
        assert_eq!(editor.surface().caret(), caret);
        assert_ne!(caret, 0);
    }
    assert_eq!(session.narrative(), "Surat keputusan kepala dinas");
}

#[tokio::test]
async fn external_replace_resyncs_focused_surface() {
    let session = Session::new(StudioConfig::default(), ScriptedBackend::new());
    let mut editor = Synchronizer::mount(
        HeadlessSurface::new(),
        "",
        session.narrative_writer(),
        SyncPolicy::ForceExternal,
    );
    editor.surface_mut().focus();
    editor.surface_mut().type_text("draf lama");
    editor.handle_input();

    session.replace_narrative("<p>versi baru</p>");
    assert_eq!(editor.render(&session.narrative()), RenderOutcome::Applied);
    assert_eq!(editor.surface().inner_html(), "<p>versi baru</p>");
}

#[tokio::test]
async fn analysis_runs_alongside_idle_phase() {
    let backend = ScriptedBackend::new();
    let session = Session::new(StudioConfig::default(), backend.clone());
    session.narrative_writer().on_change("<p>Teks <i>panjang</i> sekali.</p>");

    let report = session.analyze().await.unwrap().completed().unwrap();
    assert!(report.markup.contains("<li>"));
    assert_eq!(session.phase(), SessionPhase::Idle);

    let sent = backend.requests.lock().unwrap();
    assert!(sent[0].image.is_none());
    assert!(sent[0].user_text.contains("Teks panjang sekali."));
}

#[test]
fn upload_rejection_is_synchronous_and_non_fatal() {
    let session = Session::new(StudioConfig::default(), ScriptedBackend::new());
    tokio_test::block_on(session.upload_reference(reference_png())).unwrap();

    let doc = IncomingFile::from_bytes("laporan.docx", "application/msword", vec![0; 8]);
    let err = tokio_test::block_on(session.upload_reference(doc)).unwrap_err();
    assert!(matches!(err, DocMimicError::NotAnImage { .. }));
    assert_eq!(session.reference_image().unwrap().file_name, "template.png");
    assert_eq!(
        session.message().as_deref(),
        Some("Mohon upload file gambar (JPG, PNG, JPEG)")
    );
}

#[test]
fn word_export_is_identical_across_sessions() {
    let a = docmimic::build_envelope("<p>Pasal 1</p>", PaperSize::Legal);
    let b = docmimic::build_envelope("<p>Pasal 1</p>", PaperSize::Legal);
    assert_eq!(a, b);
    assert_eq!(a.matches("35.56cm").count(), 1);
}
