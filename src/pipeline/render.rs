//! Table rendering: draw laid-out pages into a new PDF via pdfium.
//!
//! All geometry comes from [`super::table::layout`]; this module only turns
//! [`PageLayout`]s into pdfium page objects. Like extraction, the pdfium
//! work runs inside `spawn_blocking`.
//!
//! The document is saved to a temporary file next to the destination and
//! renamed into place, so a failed run never leaves a truncated PDF behind.

use super::extract::bind_pdfium;
use super::table::{
    self, PageLayout, PlacedRow, BOX_LINE_WIDTH, COLUMN_EDGES, FONT_SIZE, FOOTER_BASELINE,
    FOOTER_FONT_SIZE, GRID_LINE_WIDTH, LEADING, NUMBER_FONT_SIZE, PAD_H, PAD_V, PAGE_WIDTH,
    SHADE_LEVEL,
};
use crate::error::ReaderError;
use crate::output::Row;
use pdfium_render::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER_SHADE_LEVEL: u8 = 230;
const GRID_GREY_LEVEL: u8 = 128;

/// Render `rows` as a numbered two-column table and write it to `output`.
///
/// Returns the number of pages written.
pub async fn render_table(
    rows: &[Row],
    header: Option<[String; 2]>,
    font_path: Option<&Path>,
    output: &Path,
) -> Result<usize, ReaderError> {
    let pages = table::layout(rows, header.as_ref());
    let page_count = pages.len();
    info!(
        "Rendering {} rows on {} pages to {}",
        rows.len(),
        page_count,
        output.display()
    );

    let font_path = font_path.map(Path::to_path_buf);
    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || draw_document(&pages, font_path.as_deref(), &output))
        .await
        .map_err(|e| ReaderError::Internal(format!("Render task panicked: {}", e)))??;

    Ok(page_count)
}

struct Fonts {
    body: PdfFontToken,
    bold: PdfFontToken,
    /// Numbers and footers always use Helvetica.
    helvetica: PdfFontToken,
}

/// Blocking implementation of table rendering.
fn draw_document(
    pages: &[PageLayout],
    font_path: Option<&Path>,
    output: &Path,
) -> Result<(), ReaderError> {
    let pdfium = bind_pdfium()?;
    let mut document = pdfium.create_new_pdf().map_err(render_error)?;
    let fonts = load_fonts(&mut document, font_path)?;

    for layout in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(render_error)?;
        draw_page(page.objects_mut(), layout, &fonts)?;
        debug!("Drew page {} ({} rows)", layout.number, layout.rows.len());
    }

    save_atomically(&document, output)
}

fn load_fonts(document: &mut PdfDocument<'_>, font_path: Option<&Path>) -> Result<Fonts, ReaderError> {
    let helvetica = document.fonts_mut().helvetica();
    let helvetica_bold = document.fonts_mut().helvetica_bold();

    let Some(path) = font_path else {
        return Ok(Fonts {
            body: helvetica,
            bold: helvetica_bold,
            helvetica,
        });
    };

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReaderError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ReaderError::RenderFailed(format!("font '{}': {}", path.display(), e)),
    })?;
    let custom = document
        .fonts_mut()
        .load_true_type_from_bytes(&bytes, true)
        .map_err(|e| ReaderError::RenderFailed(format!("font '{}': {:?}", path.display(), e)))?;
    debug!("Embedded TrueType font {}", path.display());

    Ok(Fonts {
        body: custom,
        bold: custom,
        helvetica,
    })
}

// ── Drawing ──────────────────────────────────────────────────────────────────

fn draw_page(
    objects: &mut PdfPageObjects<'_>,
    layout: &PageLayout,
    fonts: &Fonts,
) -> Result<(), ReaderError> {
    for row in &layout.rows {
        draw_row(objects, row, fonts)?;
    }

    if let Some(first) = layout.rows.first() {
        let frame = PdfRect::new_from_values(
            layout.table_bottom(),
            COLUMN_EDGES[0],
            first.top,
            COLUMN_EDGES[3],
        );
        objects
            .create_path_object_rect(
                frame,
                Some(PdfColor::new(0, 0, 0, 255)),
                Some(PdfPoints::new(BOX_LINE_WIDTH)),
                None,
            )
            .map_err(render_error)?;
    }

    let footer = format!("Page {}", layout.number);
    let x = (PAGE_WIDTH - table::text_width(&footer, FOOTER_FONT_SIZE)) / 2.0;
    put_text(
        objects,
        x,
        FOOTER_BASELINE,
        &footer,
        fonts.helvetica,
        FOOTER_FONT_SIZE,
    )
}

fn draw_row(
    objects: &mut PdfPageObjects<'_>,
    row: &PlacedRow,
    fonts: &Fonts,
) -> Result<(), ReaderError> {
    let top = row.top;
    let bottom = row.top - row.height;

    let shade = if row.header {
        Some(HEADER_SHADE_LEVEL)
    } else if row.shaded {
        Some(SHADE_LEVEL)
    } else {
        None
    };
    if let Some(level) = shade {
        let band = PdfRect::new_from_values(bottom, COLUMN_EDGES[0], top, COLUMN_EDGES[3]);
        objects
            .create_path_object_rect(band, None, None, Some(grey(level)))
            .map_err(render_error)?;
    }

    for pair in COLUMN_EDGES.windows(2) {
        let cell = PdfRect::new_from_values(bottom, pair[0], top, pair[1]);
        objects
            .create_path_object_rect(
                cell,
                Some(grey(GRID_GREY_LEVEL)),
                Some(PdfPoints::new(GRID_LINE_WIDTH)),
                None,
            )
            .map_err(render_error)?;
    }

    // Number cell: centred both ways.
    let label_width = table::text_width(&row.label, NUMBER_FONT_SIZE);
    let x = (COLUMN_EDGES[0] + COLUMN_EDGES[1] - label_width) / 2.0;
    let y = (top + bottom) / 2.0 - NUMBER_FONT_SIZE * 0.35;
    put_text(objects, x, y, &row.label, fonts.helvetica, NUMBER_FONT_SIZE)?;

    let font = if row.header { fonts.bold } else { fonts.body };
    for (col, lines) in [(1, &row.first), (2, &row.second)] {
        for (i, line) in lines.iter().enumerate() {
            let baseline = top - PAD_V - LEADING * (i as f32 + 1.0) + (LEADING - FONT_SIZE);
            put_text(objects, COLUMN_EDGES[col] + PAD_H, baseline, line, font, FONT_SIZE)?;
        }
    }
    Ok(())
}

fn put_text(
    objects: &mut PdfPageObjects<'_>,
    x: f32,
    y: f32,
    text: &str,
    font: PdfFontToken,
    size: f32,
) -> Result<(), ReaderError> {
    if text.is_empty() {
        return Ok(());
    }
    objects
        .create_text_object(
            PdfPoints::new(x),
            PdfPoints::new(y),
            text,
            font,
            PdfPoints::new(size),
        )
        .map_err(render_error)?;
    Ok(())
}

fn grey(level: u8) -> PdfColor {
    PdfColor::new(level, level, level, 255)
}

fn render_error(e: PdfiumError) -> ReaderError {
    ReaderError::RenderFailed(format!("{:?}", e))
}

// ── Output ───────────────────────────────────────────────────────────────────

/// Save to a temp file in the destination directory, then rename into place.
fn save_atomically(document: &PdfDocument<'_>, output: &Path) -> Result<(), ReaderError> {
    let write_error = |e: io::Error| ReaderError::OutputWriteFailed {
        path: output.to_path_buf(),
        source: e,
    };

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_error)?;

    let tmp = tempfile::Builder::new()
        .prefix(".parallel-reader-")
        .suffix(".pdf.tmp")
        .tempfile_in(&parent)
        .map_err(write_error)?;
    document.save_to_file(tmp.path()).map_err(render_error)?;
    tmp.persist(output).map_err(|e| write_error(e.error))?;

    info!("Wrote {}", output.display());
    Ok(())
}
