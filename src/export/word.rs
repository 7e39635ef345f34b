//! Word-processor export.
//!
//! The generated markup is wrapped in an HTML envelope that Word opens as a
//! native document: Office XML namespaces, a `<w:WordDocument>` block that
//! forces Print Layout at 100 % zoom, and an `@page` rule carrying the paper
//! size with fixed 2.54cm margins. The envelope is a fixed template; the same
//! markup and paper size always produce the same bytes.

use crate::paper::PaperSize;

/// Media type that makes browsers and mail clients hand the file to Word.
pub const WORD_MEDIA_TYPE: &str = "application/vnd.ms-word";

/// A ready-to-save Word document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPackage {
    /// `<base>.doc`
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

const HEAD_OPEN: &str = "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
xmlns:w='urn:schemas-microsoft-com:office:word' \
xmlns='http://www.w3.org/TR/REC-html40'>
<head>
<meta charset='utf-8'>
<title>Document</title>
<!--[if gte mso 9]>
<xml>
<w:WordDocument>
<w:View>Print</w:View>
<w:Zoom>100</w:Zoom>
<w:DoNotOptimizeForBrowser/>
</w:WordDocument>
</xml>
<![endif]-->
<style>
";

// Everything after the @page rule. Keep physical lengths out of here: the
// paper literals must occur only in the @page rule.
const STYLE_REST: &str = "body {
  font-family: 'Calibri', 'Arial', sans-serif;
  font-size: 11pt;
  line-height: 1.15;
  tab-interval: 36pt;
}
p {
  margin: 0;
  margin-bottom: 0pt;
}
table {
  border-collapse: collapse;
  width: 100%;
  mso-table-layout-alt: fixed;
}
td {
  vertical-align: top;
  padding: 0;
}
</style>
</head>
<body>
<div class=\"Section1\">
";

const TAIL: &str = "</div></body></html>";

/// Wrap `markup` in the Word envelope for `paper`. Markup is not modified.
pub fn build_envelope(markup: &str, paper: PaperSize) -> String {
    let dims = paper.dimensions();
    let mut out = String::with_capacity(HEAD_OPEN.len() + STYLE_REST.len() + markup.len() + 128);
    out.push_str(HEAD_OPEN);
    out.push_str("@page {\n  size: ");
    out.push_str(dims.width_css);
    out.push(' ');
    out.push_str(dims.height_css);
    out.push_str(";\n  margin: 2.54cm;\n}\n");
    out.push_str(STYLE_REST);
    out.push_str(markup);
    out.push_str(TAIL);
    out
}

/// Build the downloadable package: envelope bytes plus `<base_name>.doc`.
pub fn build_package(markup: &str, paper: PaperSize, base_name: &str) -> WordPackage {
    WordPackage {
        file_name: format!("{base_name}.doc"),
        media_type: WORD_MEDIA_TYPE,
        bytes: build_envelope(markup, paper).into_bytes(),
    }
}
