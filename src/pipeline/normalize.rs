//! Normalisation: flatten extracted text into a single-spaced stream.
//!
//! PDF text arrives with hard line breaks at every layout line, runs of
//! spaces from justified text, and form feeds between pages. Sentence and
//! speaker segmentation both assume a flat stream, so this pass runs first.
//!
//! ## Rule Order
//!
//! Form feeds must be replaced before whitespace is collapsed: `\f` is
//! whitespace, and collapsing first would erase every page break.

use once_cell::sync::Lazy;
use regex::Regex;

/// Page-break control character emitted by some extractors between pages.
pub const PAGE_BREAK: char = '\u{000C}';

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalise extracted text.
///
/// 1. Replace every form feed with `break_marker`
/// 2. Collapse every run of whitespace (newlines included) to one space
///
/// Idempotent as long as `break_marker` contains no whitespace, which
/// [`crate::config::ReaderConfigBuilder::build`] enforces.
pub fn normalize(text: &str, break_marker: &str) -> String {
    let s = replace_page_breaks(text, break_marker);
    collapse_whitespace(&s)
}

// ── Rule 1: Page breaks ──────────────────────────────────────────────────────

fn replace_page_breaks(input: &str, break_marker: &str) -> String {
    input.replace(PAGE_BREAK, break_marker)
}

// ── Rule 2: Whitespace ───────────────────────────────────────────────────────

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = ";;;;";

    #[test]
    fn collapses_newlines_and_runs() {
        assert_eq!(
            normalize("The  cat\n\nsat\t on\r\nthe mat.", MARKER),
            "The cat sat on the mat."
        );
    }

    #[test]
    fn replaces_form_feeds_with_marker() {
        assert_eq!(normalize("end.\u{000C}Start", MARKER), "end.;;;;Start");
        assert_eq!(normalize("end.\n\u{000C}\nStart", MARKER), "end. ;;;; Start");
    }

    #[test]
    fn unicode_whitespace_is_collapsed() {
        assert_eq!(normalize("a\u{00A0}\u{2003} b", MARKER), "a b");
    }

    #[test]
    fn idempotent_and_never_double_spaced() {
        let samples = [
            "",
            " ",
            "   leading and trailing   ",
            "line one\nline two\n\n\nline three",
            "tabs\t\tand\u{000C}\u{000C}breaks\u{000C} here",
            "| ---- 1 ---- |\n\nNext page  text.",
            "JAMES (aside):\n  Hello.\r\n\r\nHERMIONE: Hi.",
        ];
        for s in samples {
            let once = normalize(s, MARKER);
            let twice = normalize(&once, MARKER);
            assert_eq!(once, twice, "not idempotent for {s:?}");
            assert!(!once.contains("  "), "double space in {once:?}");
            assert!(!once.contains(PAGE_BREAK));
        }
    }
}
