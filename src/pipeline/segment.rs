//! Segmentation: cut the normalised stream into ordered translation units.
//!
//! Two strategies:
//!
//! - **Sentence** — split on whitespace right after `.`, `!` or `?`, keeping
//!   the punctuation on the left. Pieces shorter than `min_len` characters
//!   ("Mr.", "OK.", stray page numbers) are appended to the previous unit so
//!   the backend never sees a fragment on its own. The first piece has
//!   nothing to attach to and is kept as it is.
//! - **Speaker** — split before every speaker tag (`JAMES:`,
//!   `HERMIONE (smiling):`) so each unit is one turn of dialogue.
//!
//! Neither strategy reorders text or drops non-blank content.

use crate::config::SegmentStrategy;
use crate::output::Unit;
use once_cell::sync::Lazy;
use regex::Regex;

/// Terminal punctuation followed by the whitespace the split consumes.
static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// An upper-case name of 3+ letters, an optional parenthesised stage
/// direction, then a colon and whitespace.
static RE_SPEAKER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{3,}(?:\s*\([^)]*\))?:\s").unwrap());

/// Segment `text` with the given strategy and number the units from 1.
pub fn segment(text: &str, strategy: SegmentStrategy, min_len: usize) -> Vec<Unit> {
    let pieces = match strategy {
        SegmentStrategy::Sentence => split_sentences(text, min_len),
        SegmentStrategy::Speaker => split_speaker_turns(text),
    };
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, original)| Unit::new(i + 1, original))
        .collect()
}

/// Split into sentences and merge fragments shorter than `min_len` characters
/// into the preceding sentence.
pub fn split_sentences(text: &str, min_len: usize) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();

    for piece in sentence_pieces(text) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match sentences.last_mut() {
            Some(prev) if piece.chars().count() < min_len => {
                prev.push(' ');
                prev.push_str(piece);
            }
            _ => sentences.push(piece.to_string()),
        }
    }

    sentences
}

/// Split before every speaker tag; trimmed, blank turns dropped.
pub fn split_speaker_turns(text: &str) -> Vec<String> {
    let mut bounds: Vec<usize> = RE_SPEAKER_TAG.find_iter(text).map(|m| m.start()).collect();
    if bounds.first() != Some(&0) {
        bounds.insert(0, 0);
    }
    bounds.push(text.len());

    bounds
        .windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|turn| !turn.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw sentence pieces, punctuation attached, separators removed.
fn sentence_pieces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        // Terminal punctuation is a single ASCII byte.
        let end = m.start() + 1;
        pieces.push(&text[start..end]);
        start = m.end();
    }
    pieces.push(&text[start..]);
    pieces
}
