//! Paper-size presets shared by preview, Word export and PDF export.
//!
//! A single table drives all three consumers so the on-screen page, the
//! Word `@page` rule and the PDF page format can never disagree.

use crate::error::DocMimicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported paper sizes. Any other value is not a supported input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

/// Physical dimensions of a paper size.
///
/// `width_css` / `height_css` are the exact literals written into style
/// rules; `width_mm` / `height_mm` are the same values in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperDimensions {
    pub width_css: &'static str,
    pub height_css: &'static str,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PaperDimensions {
    /// Page width in PDF points (1/72 inch).
    pub fn width_pt(&self) -> f64 {
        mm_to_pt(self.width_mm)
    }

    /// Page height in PDF points (1/72 inch).
    pub fn height_pt(&self) -> f64 {
        mm_to_pt(self.height_mm)
    }
}

/// Convert millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

impl PaperSize {
    /// All sizes in selector order.
    pub const ALL: [PaperSize; 5] = [
        PaperSize::A4,
        PaperSize::Letter,
        PaperSize::Legal,
        PaperSize::A3,
        PaperSize::A5,
    ];

    pub fn dimensions(self) -> PaperDimensions {
        match self {
            PaperSize::A4 => PaperDimensions {
                width_css: "21cm",
                height_css: "29.7cm",
                width_mm: 210.0,
                height_mm: 297.0,
            },
            PaperSize::Letter => PaperDimensions {
                width_css: "21.59cm",
                height_css: "27.94cm",
                width_mm: 215.9,
                height_mm: 279.4,
            },
            PaperSize::Legal => PaperDimensions {
                width_css: "21.59cm",
                height_css: "35.56cm",
                width_mm: 215.9,
                height_mm: 355.6,
            },
            PaperSize::A3 => PaperDimensions {
                width_css: "29.7cm",
                height_css: "42cm",
                width_mm: 297.0,
                height_mm: 420.0,
            },
            PaperSize::A5 => PaperDimensions {
                width_css: "14.8cm",
                height_css: "21cm",
                width_mm: 148.0,
                height_mm: 210.0,
            },
        }
    }

    /// Canonical display name ("A4", "Letter", …).
    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::Letter => "Letter",
            PaperSize::Legal => "Legal",
            PaperSize::A3 => "A3",
            PaperSize::A5 => "A5",
        }
    }

    /// Lowercase page-format identifier used by the PDF exporter.
    pub fn pdf_format(self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::A3 => "a3",
            PaperSize::A5 => "a5",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = DocMimicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaperSize::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DocMimicError::InvalidConfig(format!(
                    "unsupported paper size '{s}' (expected A4, Letter, Legal, A3 or A5)"
                ))
            })
    }
}
