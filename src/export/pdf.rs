//! Rasterised PDF export of the preview region.
//!
//! ## Pipeline
//!
//! ```text
//! PreviewRegion ──▶ RegionRasterizer ──▶ slice into page strips ──▶ JPEG ──▶ lopdf
//!                   (scale 2)            (content-height each)     (q 98)   (portrait)
//! ```
//!
//! Turning HTML into pixels needs a layout engine, which this crate does not
//! ship. The capability is injected as a [`RegionRasterizer`]; without one
//! the export reports [`DocMimicError::RendererUnavailable`] and writes
//! nothing.
//!
//! ## Page geometry
//!
//! Each page is the paper size in portrait with a fixed margin on all sides.
//! The raster is scaled so its full width fills the content width; the
//! content height then defines how many raster rows go on one page. The last
//! page carries the remainder, top-aligned.
//!
//! ## Why spawn_blocking?
//!
//! Slicing and JPEG-encoding a scale-2 raster of a long document is CPU-bound
//! work measured in hundreds of milliseconds. It runs on the blocking pool so
//! the runtime stays responsive.

use crate::config::StudioConfig;
use crate::error::DocMimicError;
use crate::export::preview::{PreviewRegion, PREVIEW_ELEMENT_ID};
use crate::messages::{Locale, MessageKey};
use crate::observer::{NoopObserver, ObserverHandle};
use crate::paper::{mm_to_pt, PaperSize};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// PDF export parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    /// Margin on every side, in millimetres. Default: 1.
    pub margin_mm: f64,
    /// Oversampling factor passed to the rasterizer. Default: 2.
    pub scale: f32,
    /// JPEG quality, 1..=100. Default: 98.
    pub jpeg_quality: u8,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            margin_mm: 1.0,
            scale: 2.0,
            jpeg_quality: 98,
        }
    }
}

impl PdfOptions {
    pub fn validate(&self) -> Result<(), DocMimicError> {
        // A5 is the narrowest page; margins must leave it some content width.
        let narrowest = PaperSize::A5.dimensions().width_mm;
        if !(self.margin_mm >= 0.0 && self.margin_mm * 2.0 < narrowest) {
            return Err(DocMimicError::InvalidConfig(format!(
                "pdf margin_mm must be in [0, {}), got {}",
                narrowest / 2.0,
                self.margin_mm
            )));
        }
        if !(self.scale > 0.0 && self.scale <= 8.0) {
            return Err(DocMimicError::InvalidConfig(format!(
                "pdf scale must be in (0, 8], got {}",
                self.scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(DocMimicError::InvalidConfig(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Renders a preview region to pixels.
///
/// Implementations wrap a headless browser or any other HTML layout engine.
/// The returned raster must span the region's full width.
#[async_trait]
pub trait RegionRasterizer: Send + Sync {
    async fn rasterize(&self, region: &PreviewRegion, scale: f32) -> Result<DynamicImage, DocMimicError>;
}

/// A finished PDF, not yet saved.
#[derive(Debug, Clone)]
pub struct PdfPackage {
    /// `<base>.pdf`
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub enum PdfOutcome {
    /// No preview region exists yet; nothing was done.
    Skipped,
    Rendered(PdfPackage),
}

/// Exports preview regions to PDF. One export at a time.
pub struct PdfExporter {
    backend: Option<Arc<dyn RegionRasterizer>>,
    options: PdfOptions,
    locale: Locale,
    base_name: String,
    observer: ObserverHandle,
    pending: AtomicBool,
}

/// Clears the pending flag however the export ends.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PdfExporter {
    pub fn new(config: &StudioConfig, backend: Option<Arc<dyn RegionRasterizer>>) -> Self {
        Self {
            backend,
            options: config.pdf.clone(),
            locale: config.locale,
            base_name: config.export_base_name.clone(),
            observer: Arc::new(NoopObserver),
            pending: AtomicBool::new(false),
        }
    }

    pub fn with_observer(mut self, observer: ObserverHandle) -> Self {
        self.observer = observer;
        self
    }

    /// True while an export is running; the trigger should be disabled.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn has_renderer(&self) -> bool {
        self.backend.is_some()
    }

    /// Export `region` to a PDF sized to its paper.
    ///
    /// A missing region is a silent no-op. A missing renderer raises a
    /// one-shot notice through the observer and returns
    /// [`DocMimicError::RendererUnavailable`].
    pub async fn export(&self, region: Option<&PreviewRegion>) -> Result<PdfOutcome, DocMimicError> {
        let Some(region) = region else {
            debug!("No preview region; PDF export skipped");
            return Ok(PdfOutcome::Skipped);
        };

        let Some(backend) = self.backend.as_ref() else {
            let message = self.locale.message(MessageKey::RendererUnavailable).to_string();
            warn!("PDF export requested without a rasterizer");
            self.observer.on_notice(&message);
            return Err(DocMimicError::RendererUnavailable { message });
        };

        if self.pending.swap(true, Ordering::SeqCst) {
            return Err(DocMimicError::ExportAlreadyRunning);
        }
        let _guard = PendingGuard(&self.pending);

        let file_name = format!("{}.pdf", self.base_name);
        self.observer.on_export_started(&file_name);
        let result = self.render(backend.as_ref(), region).await;
        self.observer.on_export_settled(&file_name, result.is_ok());

        let (bytes, page_count) = result?;
        Ok(PdfOutcome::Rendered(PdfPackage {
            file_name,
            bytes,
            page_count,
        }))
    }

    async fn render(
        &self,
        backend: &dyn RegionRasterizer,
        region: &PreviewRegion,
    ) -> Result<(Vec<u8>, usize), DocMimicError> {
        let start = Instant::now();
        let raster = backend.rasterize(region, self.options.scale).await?;
        debug!(
            "Rasterised '{}' to {}x{} in {:?}",
            region.id,
            raster.width(),
            raster.height(),
            start.elapsed()
        );

        let paper = region.paper;
        let options = self.options.clone();
        let (bytes, pages) = tokio::task::spawn_blocking(move || {
            paginate_to_pdf(&raster.to_rgb8(), paper, &options)
        })
        .await
        .map_err(|e| DocMimicError::Internal(format!("PDF task panicked: {}", e)))??;

        info!(
            "PDF ready: {} page(s), {} bytes in {:?}",
            pages,
            bytes.len(),
            start.elapsed()
        );
        Ok((bytes, pages))
    }
}

/// Raster rows that fit on one page for a raster `raster_width` pixels wide.
pub fn page_strip_height(raster_width: u32, paper: PaperSize, margin_mm: f64) -> u32 {
    let dims = paper.dimensions();
    let content_w_mm = dims.width_mm - 2.0 * margin_mm;
    let content_h_mm = dims.height_mm - 2.0 * margin_mm;
    let px_per_mm = raster_width as f64 / content_w_mm;
    ((content_h_mm * px_per_mm).round() as u32).max(1)
}

/// Slice a raster into page strips and build the PDF. Blocking.
pub fn paginate_to_pdf(
    raster: &RgbImage,
    paper: PaperSize,
    options: &PdfOptions,
) -> Result<(Vec<u8>, usize), DocMimicError> {
    let (img_w, img_h) = raster.dimensions();
    if img_w == 0 || img_h == 0 {
        return Err(DocMimicError::RasterisationFailed {
            region: PREVIEW_ELEMENT_ID.to_string(),
            detail: format!("empty raster ({img_w}x{img_h})"),
        });
    }

    let dims = paper.dimensions();
    let margin = options.margin_mm;
    let content_w_mm = dims.width_mm - 2.0 * margin;
    let px_per_mm = img_w as f64 / content_w_mm;
    let strip_h = page_strip_height(img_w, paper, margin);
    let page_count = img_h.div_ceil(strip_h) as usize;
    debug!(
        "{} px/mm, {} rows per page, {} page(s) on {}",
        px_per_mm, strip_h, page_count, paper
    );

    let page_w_pt = dims.width_pt();
    let page_h_pt = dims.height_pt();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);

    for index in 0..page_count as u32 {
        let top = index * strip_h;
        let rows = strip_h.min(img_h - top);
        let strip = image::imageops::crop_imm(raster, 0, top, img_w, rows).to_image();
        let jpeg = encode_jpeg(&strip, options.jpeg_quality)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => img_w as i64,
                "Height" => rows as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let draw_w = mm_to_pt(content_w_mm) as f32;
        let draw_h = mm_to_pt(rows as f64 / px_per_mm) as f32;
        let x = mm_to_pt(margin) as f32;
        let y = (page_h_pt - mm_to_pt(margin)) as f32 - draw_h;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        draw_w.into(),
                        0.0f32.into(),
                        0.0f32.into(),
                        draw_h.into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| DocMimicError::PdfEncodingFailed(format!("page {}: {}", index + 1, e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => page_count as i64,
            "Kids" => kids,
            "MediaBox" => vec![
                0.0f32.into(),
                0.0f32.into(),
                (page_w_pt as f32).into(),
                (page_h_pt as f32).into(),
            ],
        },
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DocMimicError::PdfEncodingFailed(e.to_string()))?;
    Ok((bytes, page_count))
}

fn encode_jpeg(strip: &RgbImage, quality: u8) -> Result<Vec<u8>, DocMimicError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(strip)
        .map_err(|e| DocMimicError::PdfEncodingFailed(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf)
}
