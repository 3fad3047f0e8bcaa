//! Aligned table: rows from units, then a pure page layout for the renderer.
//!
//! Building rows is where a unit's translation state is finally flattened
//! to display text (a sentinel for failures, empty for never-attempted
//! units). Column order only swaps the two text cells; the pairing of an
//! original with its own translation never changes.
//!
//! Layout works in PDF points with the origin at the bottom-left of an A4
//! page. Text is wrapped with Helvetica advance widths, so [`layout`] is
//! deterministic and fully testable without a pdfium library.
//!
//! ```text
//!  MARGIN ┌────┬──────────────────┬──────────────────┐
//!         │ #  │ first column     │ second column    │  ← optional header
//!         ├────┼──────────────────┼──────────────────┤
//!         │ 1  │ wrapped text     │ wrapped text     │  ← white
//!         │ 2  │ …                │ …                │  ← light grey
//!         └────┴──────────────────┴──────────────────┘
//!                           Page N
//! ```

use crate::config::ColumnOrder;
use crate::output::{Row, Unit};

// ── Geometry ─────────────────────────────────────────────────────────────────

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 30.0;
pub const NUMBER_COL_WIDTH: f32 = 24.0;
/// Width of each of the two text columns.
pub const TEXT_COL_WIDTH: f32 = (PAGE_WIDTH - 2.0 * MARGIN - NUMBER_COL_WIDTH) / 2.0;

pub const FONT_SIZE: f32 = 11.0;
pub const NUMBER_FONT_SIZE: f32 = 9.0;
pub const LEADING: f32 = 14.0;
pub const PAD_V: f32 = 8.0;
pub const PAD_H: f32 = 6.0;

pub const FOOTER_FONT_SIZE: f32 = 9.0;
/// Baseline of the page-number footer.
pub const FOOTER_BASELINE: f32 = 20.0;

pub const GRID_LINE_WIDTH: f32 = 0.5;
pub const BOX_LINE_WIDTH: f32 = 1.0;
/// Grey level (0-255) of shaded rows.
pub const SHADE_LEVEL: u8 = 247;

/// Advance of bold glyphs relative to regular ones, for header wrapping.
const BOLD_WIDTH_FACTOR: f32 = 1.1;

/// Usable text width inside a text cell.
const CELL_TEXT_WIDTH: f32 = TEXT_COL_WIDTH - 2.0 * PAD_H;
const CONTENT_TOP: f32 = PAGE_HEIGHT - MARGIN;
const CONTENT_BOTTOM: f32 = MARGIN;

/// Left edges of the number column, first text column, second text column,
/// and the right edge of the table.
pub const COLUMN_EDGES: [f32; 4] = [
    MARGIN,
    MARGIN + NUMBER_COL_WIDTH,
    MARGIN + NUMBER_COL_WIDTH + TEXT_COL_WIDTH,
    PAGE_WIDTH - MARGIN,
];

// ── Rows ─────────────────────────────────────────────────────────────────────

/// One row per unit, in unit order, text cells arranged by `order`.
pub fn build_rows(units: &[Unit], order: ColumnOrder) -> Vec<Row> {
    units
        .iter()
        .map(|unit| {
            let original = unit.original.clone();
            let translation = unit.translation.display_text().to_string();
            let (first, second) = match order {
                ColumnOrder::OriginalFirst => (original, translation),
                ColumnOrder::TranslationFirst => (translation, original),
            };
            Row {
                number: unit.index,
                first,
                second,
            }
        })
        .collect()
}

/// Header cell labels for the two text columns, arranged by `order`.
pub fn header_labels(order: ColumnOrder, source_lang: &str, target_lang: &str) -> [String; 2] {
    let original = format!("Original ({source_lang})");
    let translation = format!("Translation ({target_lang})");
    match order {
        ColumnOrder::OriginalFirst => [original, translation],
        ColumnOrder::TranslationFirst => [translation, original],
    }
}

// ── Text measurement ─────────────────────────────────────────────────────────

/// Helvetica advance widths (1/1000 em) for ASCII 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N'..'Z'
    278, 278, 278, 469, 556, 333,                                                   // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n'..'z'
    334, 260, 334, 584,                                                             // '{'..'~'
];

fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 0x20],
        // CJK and other full-width scripts.
        '\u{2E80}'..='\u{9FFF}' | '\u{AC00}'..='\u{D7AF}' | '\u{FF00}'..='\u{FFEF}' => 1000,
        _ => 556,
    }
}

/// Width of `text` in points at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    units as f32 * font_size / 1000.0
}

/// Greedy word wrap to `max_width` points. Words wider than a whole line
/// are broken between characters. Empty text yields no lines.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, font_size) <= max_width {
            current = word.to_string();
        } else {
            for piece in break_word(word, font_size, max_width) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = piece;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if piece.chars().count() > 1 && text_width(&piece, font_size) > max_width {
            piece.pop();
            pieces.push(std::mem::replace(&mut piece, c.to_string()));
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// One laid-out page of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based page number, shown in the footer.
    pub number: usize,
    pub rows: Vec<PlacedRow>,
}

impl PageLayout {
    /// Bottom edge of the last row, or the top of the content area.
    pub fn table_bottom(&self) -> f32 {
        self.rows
            .last()
            .map(|r| r.top - r.height)
            .unwrap_or(CONTENT_TOP)
    }
}

/// A row (or a slice of a split row) positioned on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    /// Text of the number cell: `#` for headers, the unit number otherwise.
    pub label: String,
    pub first: Vec<String>,
    pub second: Vec<String>,
    /// y of the top edge.
    pub top: f32,
    pub height: f32,
    pub shaded: bool,
    pub header: bool,
}

fn row_height(line_count: usize) -> f32 {
    line_count.max(1) as f32 * LEADING + 2.0 * PAD_V
}

/// Lines of wrapped text that fit in `space` points of row height.
fn lines_fitting(space: f32) -> usize {
    ((space - 2.0 * PAD_V) / LEADING).floor().max(0.0) as usize
}

struct PageBuilder {
    pages: Vec<PageLayout>,
    cursor: f32,
    header: Option<(Vec<String>, Vec<String>)>,
}

impl PageBuilder {
    fn new(header: Option<&[String; 2]>) -> Self {
        let wrap_bold = |s: &str| wrap_text(s, FONT_SIZE, CELL_TEXT_WIDTH / BOLD_WIDTH_FACTOR);
        let mut builder = Self {
            pages: Vec::new(),
            cursor: CONTENT_TOP,
            header: header.map(|[a, b]| (wrap_bold(a), wrap_bold(b))),
        };
        builder.start_page();
        builder
    }

    fn start_page(&mut self) {
        self.pages.push(PageLayout {
            number: self.pages.len() + 1,
            rows: Vec::new(),
        });
        self.cursor = CONTENT_TOP;
        if let Some((first, second)) = self.header.clone() {
            self.place("#".to_string(), first, second, false, true);
        }
    }

    fn remaining(&self) -> f32 {
        self.cursor - CONTENT_BOTTOM
    }

    /// Height available to body rows on a fresh page.
    fn fresh_page_space(&self) -> f32 {
        let header = self
            .header
            .as_ref()
            .map(|(a, b)| row_height(a.len().max(b.len())))
            .unwrap_or(0.0);
        CONTENT_TOP - CONTENT_BOTTOM - header
    }

    fn page_has_body(&self) -> bool {
        self.pages
            .last()
            .is_some_and(|p| p.rows.iter().any(|r| !r.header))
    }

    fn place(&mut self, label: String, first: Vec<String>, second: Vec<String>, shaded: bool, header: bool) {
        let height = row_height(first.len().max(second.len()));
        let row = PlacedRow {
            label,
            first,
            second,
            top: self.cursor,
            height,
            shaded,
            header,
        };
        self.cursor -= height;
        if let Some(page) = self.pages.last_mut() {
            page.rows.push(row);
        }
    }

    fn push_row(&mut self, row: &Row) {
        let label = row.number.to_string();
        let shaded = row.number % 2 == 0;
        let mut first = wrap_text(&row.first, FONT_SIZE, CELL_TEXT_WIDTH);
        let mut second = wrap_text(&row.second, FONT_SIZE, CELL_TEXT_WIDTH);

        loop {
            let lines = first.len().max(second.len());
            let height = row_height(lines);
            if height <= self.remaining() {
                self.place(label, first, second, shaded, false);
                return;
            }
            // Move whole rows that fit on a fresh page instead of splitting.
            let movable =
                height <= self.fresh_page_space() || lines_fitting(self.remaining()) == 0;
            if movable && self.page_has_body() {
                self.start_page();
                continue;
            }
            let fit = lines_fitting(self.remaining()).max(1);
            let rest_first = first.split_off(fit.min(first.len()));
            let rest_second = second.split_off(fit.min(second.len()));
            self.place(label.clone(), first, second, shaded, false);
            self.start_page();
            first = rest_first;
            second = rest_second;
        }
    }
}

/// Lay `rows` out over as many pages as needed.
///
/// Always yields at least one page. With `header`, a bold label row opens
/// every page. A row taller than a page is split at a line boundary and
/// continues on the next page under the same number.
pub fn layout(rows: &[Row], header: Option<&[String; 2]>) -> Vec<PageLayout> {
    let mut builder = PageBuilder::new(header);
    for row in rows {
        builder.push_row(row);
    }
    builder.pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Translation, TranslationFailure, SENTINEL_QUOTA_EXCEEDED};

    fn row(number: usize, first: &str, second: &str) -> Row {
        Row {
            number,
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    fn sample_units() -> Vec<Unit> {
        let mut units = vec![
            Unit::new(1, "Hello."),
            Unit::new(2, "Out of credit."),
            Unit::new(3, "Never sent."),
        ];
        units[0].translation = Translation::Translated("Hej.".into());
        units[1].translation = Translation::Failed(TranslationFailure::QuotaExceeded);
        units
    }

    #[test]
    fn rows_keep_unit_order_and_pairing() {
        let units = sample_units();
        let a = build_rows(&units, ColumnOrder::OriginalFirst);
        let b = build_rows(&units, ColumnOrder::TranslationFirst);

        assert_eq!(a.len(), 3);
        assert_eq!(a[0], row(1, "Hello.", "Hej."));
        assert_eq!(a[1], row(2, "Out of credit.", SENTINEL_QUOTA_EXCEEDED));
        assert_eq!(a[2], row(3, "Never sent.", ""));
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.number, y.number);
            assert_eq!((&x.first, &x.second), (&y.second, &y.first));
        }
    }

    #[test]
    fn header_follows_column_order() {
        let [a, b] = header_labels(ColumnOrder::TranslationFirst, "EN", "DA");
        assert_eq!(a, "Translation (DA)");
        assert_eq!(b, "Original (EN)");
    }

    #[test]
    fn columns_span_the_content_width() {
        assert!((COLUMN_EDGES[3] - COLUMN_EDGES[0] - (PAGE_WIDTH - 2.0 * MARGIN)).abs() < 0.01);
        assert!((COLUMN_EDGES[2] - COLUMN_EDGES[1] - TEXT_COL_WIDTH).abs() < 0.01);
    }

    #[test]
    fn width_uses_helvetica_metrics() {
        // "Hi" = 722 + 222 units.
        assert!((text_width("Hi", 10.0) - 9.44).abs() < 0.001);
        assert_eq!(text_width("", 11.0), 0.0);
    }

    #[test]
    fn wrap_keeps_every_word_in_order() {
        let text = "The quick brown fox jumps over the lazy dog ".repeat(12);
        let lines = wrap_text(&text, FONT_SIZE, CELL_TEXT_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FONT_SIZE) <= CELL_TEXT_WIDTH);
        }
        assert_eq!(lines.join(" "), text.trim_end());
    }

    #[test]
    fn overlong_words_are_broken() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, FONT_SIZE, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        assert!(lines.iter().all(|l| text_width(l, FONT_SIZE) <= 50.0));
    }

    #[test]
    fn empty_text_wraps_to_nothing() {
        assert!(wrap_text("", FONT_SIZE, CELL_TEXT_WIDTH).is_empty());
        assert!(wrap_text("   ", FONT_SIZE, CELL_TEXT_WIDTH).is_empty());
    }

    #[test]
    fn empty_table_is_one_page() {
        let pages = layout(&[], None);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].rows.is_empty());
    }

    #[test]
    fn rows_stack_downwards_and_alternate_shading() {
        let rows = vec![row(1, "a", "b"), row(2, "c", "d"), row(3, "e", "")];
        let pages = layout(&rows, None);
        let placed = &pages[0].rows;
        assert_eq!(placed.len(), 3);
        assert_eq!(placed[0].top, PAGE_HEIGHT - MARGIN);
        for pair in placed.windows(2) {
            assert!((pair[0].top - pair[0].height - pair[1].top).abs() < 0.001);
        }
        assert_eq!(
            placed.iter().map(|r| r.shaded).collect::<Vec<_>>(),
            vec![false, true, false]
        );
        // An empty cell still gets a one-line row.
        assert_eq!(placed[2].height, row_height(1));
    }

    #[test]
    fn many_rows_paginate_with_repeated_header() {
        let rows: Vec<Row> = (1..=200).map(|i| row(i, "Original text.", "Oversat tekst.")).collect();
        let labels = header_labels(ColumnOrder::OriginalFirst, "EN", "DA");
        let pages = layout(&rows, Some(&labels));

        assert!(pages.len() > 1);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.number, i + 1);
            assert!(page.rows[0].header);
            assert_eq!(page.rows[0].label, "#");
            assert!(page.table_bottom() >= MARGIN - 0.001);
        }
        let numbers: Vec<String> = pages
            .iter()
            .flat_map(|p| p.rows.iter().filter(|r| !r.header).map(|r| r.label.clone()))
            .collect();
        let expected: Vec<String> = (1..=200).map(|i| i.to_string()).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn oversized_row_splits_and_keeps_its_number() {
        let long = "word ".repeat(3000);
        let rows = vec![row(1, "short", ""), row(2, &long, "kort")];
        let pages = layout(&rows, None);
        assert!(pages.len() >= 2);

        let pieces: Vec<&PlacedRow> = pages
            .iter()
            .flat_map(|p| &p.rows)
            .filter(|r| r.label == "2")
            .collect();
        assert!(pieces.len() >= 2);
        let total_lines: usize = pieces.iter().map(|r| r.first.len()).sum();
        assert_eq!(total_lines, wrap_text(&long, FONT_SIZE, CELL_TEXT_WIDTH).len());
        assert_eq!(pieces[0].second, vec!["kort".to_string()]);
        assert!(pieces.iter().all(|r| r.shaded));
        for page in &pages {
            assert!(page.table_bottom() >= MARGIN - 0.001);
        }
    }

    #[test]
    fn row_that_fits_a_fresh_page_moves_instead_of_splitting() {
        // Fill most of page one, then add a medium row.
        let mut rows: Vec<Row> = (1..=24).map(|i| row(i, "filler", "filler")).collect();
        let medium = "line ".repeat(200);
        rows.push(row(25, &medium, ""));
        let pages = layout(&rows, None);
        let pieces = pages
            .iter()
            .flat_map(|p| &p.rows)
            .filter(|r| r.label == "25")
            .count();
        assert_eq!(pieces, 1);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].rows[0].label, "25");
    }
}
