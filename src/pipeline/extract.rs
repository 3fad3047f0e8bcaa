//! Text extraction: turn a PDF or plain-text source into one text stream.
//!
//! PDF pages are read in document order through pdfium, stopping after
//! `limit` pages. Each non-empty page is followed by a page marker so a
//! reader of the final table can find their place in the source book.
//! Plain-text sources are read verbatim up to `limit` lines, unmarked.
//!
//! pdfium is not async-safe, so PDF extraction runs on the blocking pool.

use crate::config::PageMarker;
use crate::error::ReaderError;
use pdfium_render::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or the directory holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Kind of source document, decided from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Text,
}

impl SourceKind {
    /// Classify a path by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ReaderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Ok(SourceKind::Pdf),
            Some("txt") => Ok(SourceKind::Text),
            _ => Err(ReaderError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Extract the text of a source document, trimmed of surrounding whitespace.
///
/// `limit` caps the number of pages (PDF) or lines (text) read.
pub async fn extract_text(
    path: &Path,
    limit: usize,
    marker: &PageMarker,
) -> Result<String, ReaderError> {
    let kind = SourceKind::from_path(path)?;
    check_readable(path)?;

    let text = match kind {
        SourceKind::Pdf => {
            let owned = path.to_path_buf();
            let pages = tokio::task::spawn_blocking(move || pdf_page_texts_blocking(&owned, limit))
                .await
                .map_err(|e| ReaderError::Internal(format!("Extraction task panicked: {}", e)))??;
            assemble_pages(pages, limit, marker)
        }
        SourceKind::Text => {
            let file = File::open(path).map_err(|e| extraction_error(path, e))?;
            read_lines(BufReader::new(file), limit).map_err(|e| extraction_error(path, e))?
        }
    };

    info!(
        "Extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Join page texts, appending a marker after each non-empty page.
///
/// Only the first `limit` pages are considered. Pages whose text is blank
/// are skipped without a placeholder, but still count towards the limit.
pub fn assemble_pages<I, S>(pages: I, limit: usize, marker: &PageMarker) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for (idx, page) in pages.into_iter().take(limit).enumerate() {
        let page = page.as_ref();
        if page.trim().is_empty() {
            debug!("Page {} has no extractable text, skipping", idx + 1);
            continue;
        }
        text.push_str(page);
        text.push('\n');
        text.push_str(&marker.render(idx + 1));
        text.push('\n');
        debug!("Processed page {}", idx + 1);
    }
    text.trim().to_string()
}

/// Read at most `limit` lines verbatim (line endings included), then trim.
pub fn read_lines<R: BufRead>(mut reader: R, limit: usize) -> std::io::Result<String> {
    let mut text = String::new();
    for _ in 0..limit {
        if reader.read_line(&mut text)? == 0 {
            break;
        }
    }
    Ok(text.trim().to_string())
}

/// Bind to a pdfium library.
///
/// Tries `PDFIUM_LIB_PATH` (file or directory) first, then a library next
/// to the working directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, ReaderError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(configured) if !configured.is_empty() => {
            let configured = PathBuf::from(configured);
            let library = if configured.is_dir() {
                PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&configured))
            } else {
                configured
            };
            Pdfium::bind_to_library(&library)
        }
        _ => {
            let local = PathBuf::from(Pdfium::pdfium_platform_library_name_at_path("./"));
            Pdfium::bind_to_library(&local).or_else(|_| Pdfium::bind_to_system_library())
        }
    }
    .map_err(|e| ReaderError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of PDF text extraction.
///
/// Returns the raw text of at most `limit` pages, in document order.
fn pdf_page_texts_blocking(pdf_path: &Path, limit: usize) -> Result<Vec<String>, ReaderError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                "document is encrypted and requires a password".to_string()
            } else {
                err_str
            };
            ReaderError::Extraction {
                path: pdf_path.to_path_buf(),
                detail,
            }
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages, reading up to {}", pages.len(), limit);

    let mut texts = Vec::new();
    for (idx, page) in pages.iter().take(limit).enumerate() {
        let text = page.text().map_err(|e| ReaderError::Extraction {
            path: pdf_path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        texts.push(text.all());
    }

    Ok(texts)
}

/// Validate that the source exists and is readable.
fn check_readable(path: &Path) -> Result<(), ReaderError> {
    if !path.exists() {
        return Err(ReaderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match File::open(path) {
        Ok(mut f) => {
            let mut first_byte = [0u8; 1];
            f.read(&mut first_byte).map_err(|e| extraction_error(path, e))?;
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ReaderError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(extraction_error(path, e)),
    }
}

fn extraction_error(path: &Path, err: std::io::Error) -> ReaderError {
    ReaderError::Extraction {
        path: path.to_path_buf(),
        detail: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn source_kind_from_extension() {
        assert_eq!(
            SourceKind::from_path(Path::new("book.PDF")).unwrap(),
            SourceKind::Pdf
        );
        assert_eq!(
            SourceKind::from_path(Path::new("script.txt")).unwrap(),
            SourceKind::Text
        );
        assert!(matches!(
            SourceKind::from_path(Path::new("notes.docx")),
            Err(ReaderError::UnsupportedFormat { .. })
        ));
        assert!(SourceKind::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn page_limit_truncates_silently() {
        let pages = ["First page.", "Second page."];
        let text = assemble_pages(pages, 1, &PageMarker::Dashes);
        assert_eq!(text, "First page.\n| ---- 1 ---- |");
        assert!(!text.contains("Second"));
        assert_eq!(text.matches("| ---- ").count(), 1);
    }

    #[test]
    fn blank_pages_are_skipped_but_keep_numbering() {
        let pages = ["Cover.", "   ", "Chapter one."];
        let text = assemble_pages(pages, 10, &PageMarker::Dashes);
        assert!(text.contains("| ---- 1 ---- |"));
        assert!(!text.contains("| ---- 2 ---- |"));
        assert!(text.contains("Chapter one.\n| ---- 3 ---- |"));
    }

    #[test]
    fn blank_pages_count_towards_limit() {
        let pages = ["", "", "Late text."];
        assert_eq!(assemble_pages(pages, 2, &PageMarker::Dashes), "");
    }

    #[test]
    fn custom_marker_is_used() {
        let text = assemble_pages(["x"], 5, &PageMarker::Custom("[p{page}]".into()));
        assert_eq!(text, "x\n[p1]");
    }

    #[test]
    fn read_lines_respects_limit_and_keeps_line_breaks() {
        let input = Cursor::new("one\ntwo\nthree\nfour\n");
        assert_eq!(read_lines(input, 2).unwrap(), "one\ntwo");

        let short = Cursor::new("  only line  ");
        assert_eq!(read_lines(short, 100).unwrap(), "only line");
    }

    #[test]
    fn read_lines_rejects_invalid_utf8() {
        let input = Cursor::new(vec![0xff, 0xfe, b'\n']);
        assert!(read_lines(input, 10).is_err());
    }

    #[tokio::test]
    async fn extract_text_file_with_line_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("play.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "JAMES: Hello.").unwrap();
        writeln!(f, "ANNA: Hi.").unwrap();
        writeln!(f, "JAMES: Bye.").unwrap();
        drop(f);

        let text = extract_text(&path, 2, &PageMarker::Dashes).await.unwrap();
        assert_eq!(text, "JAMES: Hello.\nANNA: Hi.");
        assert!(!text.contains("----"), "text sources carry no page markers");
    }

    #[tokio::test]
    async fn extract_missing_file_is_an_error_not_a_panic() {
        let err = extract_text(Path::new("/definitely/not/here.txt"), 10, &PageMarker::Dashes)
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn extract_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, b"PK").unwrap();
        let err = extract_text(&path, 10, &PageMarker::Dashes).await.unwrap_err();
        assert!(matches!(err, ReaderError::UnsupportedFormat { .. }));
    }
}
