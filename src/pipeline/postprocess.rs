//! Post-processing of model output and narrative text.
//!
//! Two deterministic string passes live here:
//!
//! - [`strip_code_fences`] removes the ` ```html ` / ` ``` ` markers models
//!   sometimes wrap around markup even when told not to. Nothing else about
//!   the returned markup is validated or rewritten.
//! - [`plain_text`] drops tags from narrative markup. It is used both for
//!   the "has the user written anything" check and for the analysis request,
//!   which only cares about the words.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:html)?").unwrap());

/// Remove every literal ` ```html ` and ` ``` ` marker from model output.
///
/// Markers are removed wherever they occur, not only at the edges. Whitespace
/// around them is left untouched.
pub fn strip_code_fences(input: &str) -> String {
    RE_FENCE.replace_all(input, "").into_owned()
}

// A trailing `>` is optional so an unterminated tag at the end is dropped too.
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>?").unwrap());

/// Strip all tags from markup, keeping text content as-is.
pub fn plain_text(markup: &str) -> String {
    RE_TAG.replace_all(markup, "").into_owned()
}

/// Number of characters of visible text (tags stripped, untrimmed).
pub fn plain_text_len(markup: &str) -> usize {
    plain_text(markup).chars().count()
}

/// True when the markup contains visible text other than whitespace.
pub fn has_visible_text(markup: &str) -> bool {
    !plain_text(markup).trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fence() {
        let input = "```html\n<div>Hi</div>\n```";
        assert_eq!(strip_code_fences(input), "\n<div>Hi</div>\n");
    }

    #[test]
    fn strips_bare_fences_anywhere() {
        let input = "<p>a</p>```<p>b</p>```";
        assert_eq!(strip_code_fences(input), "<p>a</p><p>b</p>");
    }

    #[test]
    fn no_fences_passthrough() {
        let input = "<div><b>keep</b> `code`</div>";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn plain_text_drops_tags() {
        assert_eq!(plain_text("<p>Halo <b>dunia</b></p>"), "Halo dunia");
    }

    #[test]
    fn plain_text_drops_unterminated_tag() {
        assert_eq!(plain_text("text<br"), "text");
    }

    #[test]
    fn visible_text_detection() {
        assert!(!has_visible_text(""));
        assert!(!has_visible_text("<p> </p><br>"));
        assert!(has_visible_text("<p>x</p>"));
    }

    #[test]
    fn plain_text_len_counts_chars() {
        assert_eq!(plain_text_len("<i>héllo</i>"), 5);
    }
}
