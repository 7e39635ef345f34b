//! The on-screen preview region that PDF export rasterises.

use crate::paper::PaperSize;
use serde::Serialize;

/// Element id of the preview region.
pub const PREVIEW_ELEMENT_ID: &str = "document-preview";

/// A rendered page-shaped preview of the generated markup.
///
/// Styled to the same physical width as the selected paper, with a minimum
/// height of one page and the same 2.54cm inner padding as the Word margins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRegion {
    pub id: &'static str,
    pub paper: PaperSize,
    pub style: String,
    pub markup: String,
}

impl PreviewRegion {
    pub fn new(markup: &str, paper: PaperSize) -> Self {
        let dims = paper.dimensions();
        Self {
            id: PREVIEW_ELEMENT_ID,
            paper,
            style: format!(
                "width: {}; min-height: {}; padding: 2.54cm; box-sizing: border-box; background: #ffffff;",
                dims.width_css, dims.height_css
            ),
            markup: markup.to_string(),
        }
    }

    /// The region as a standalone HTML element.
    pub fn to_html(&self) -> String {
        format!(
            "<div id=\"{}\" style=\"{}\">{}</div>",
            self.id, self.style, self.markup
        )
    }
}
