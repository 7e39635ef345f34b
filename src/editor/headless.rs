use super::{EditingSurface, FormatCommand};
use std::ops::Range;

/// In-memory [`EditingSurface`] with a caret, a selection and focus state.
///
/// Offsets are byte offsets into the markup and are clamped to character
/// boundaries. Used by the CLI and by tests; a UI binding implements
/// [`EditingSurface`] over its own widget instead.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    html: String,
    caret: usize,
    selection: Option<Range<usize>>,
    focused: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.caret = floor_boundary(&self.html, offset);
        self.selection = None;
    }

    /// Select a byte range. The caret moves to its end.
    pub fn select(&mut self, range: Range<usize>) {
        let start = floor_boundary(&self.html, range.start);
        let end = floor_boundary(&self.html, range.end.max(start));
        self.selection = Some(start..end);
        self.caret = end;
    }

    /// Insert text at the caret, replacing any selection.
    pub fn type_text(&mut self, text: &str) {
        if let Some(range) = self.selection.take() {
            self.html.replace_range(range.clone(), "");
            self.caret = range.start;
        }
        self.html.insert_str(self.caret, text);
        self.caret += text.len();
    }
}

impl EditingSurface for HeadlessSurface {
    fn inner_html(&self) -> String {
        self.html.clone()
    }

    fn set_inner_html(&mut self, html: &str) {
        self.html = html.to_string();
        self.caret = 0;
        self.selection = None;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    /// Wraps the selection; a collapsed selection is left alone.
    fn apply_format(&mut self, command: FormatCommand) {
        let range = match self.selection.clone() {
            Some(r) if !r.is_empty() => r,
            _ => return,
        };

        let (open, close) = match command {
            FormatCommand::Bold => ("<b>", "</b>"),
            FormatCommand::Italic => ("<i>", "</i>"),
            FormatCommand::Underline => ("<u>", "</u>"),
            FormatCommand::UnorderedList => ("<ul><li>", "</li></ul>"),
            FormatCommand::OrderedList => ("<ol><li>", "</li></ol>"),
        };

        self.html.insert_str(range.end, close);
        self.html.insert_str(range.start, open);

        let inner_start = range.start + open.len();
        let inner_end = range.end + open.len();
        self.selection = Some(inner_start..inner_end);
        self.caret = inner_end;
    }
}

fn floor_boundary(s: &str, offset: usize) -> usize {
    let mut i = offset.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
