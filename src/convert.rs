//! Top-level entry points.
//!
//! The run is split in two so a caller can show a cost estimate and ask
//! for confirmation before any request is sent:
//!
//! ```text
//! prepare()            extract → normalize → segment      (no network)
//! estimate_cost()      characters × price                 (pure)
//! translate_units()    one backend call per unit           (network)
//! write_table()        rows → layout → PDF                 (pdfium)
//! ```
//!
//! [`translate_document`] runs all four in one call.

use crate::backend::{self, TranslationBackend};
use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::output::{CostEstimate, TranslationRun, Unit};
use crate::pipeline::{extract, normalize, render, segment, table};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use crate::pipeline::translate::translate_units;

/// Extract, normalise and segment a source document into untranslated units.
///
/// # Errors
/// Fatal only: missing or unreadable source, unsupported extension,
/// unreadable PDF, or no pdfium library to bind.
pub async fn prepare(
    input: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<Vec<Unit>, ReaderError> {
    let input = input.as_ref();
    info!("Preparing {}", input.display());

    // ── Step 1: Extract ──────────────────────────────────────────────────
    let raw = extract::extract_text(input, config.limit, &config.page_marker).await?;

    // ── Step 2: Normalise ────────────────────────────────────────────────
    let flat = normalize::normalize(&raw, &config.break_marker);
    debug!("Normalised to {} characters", flat.chars().count());

    // ── Step 3: Segment ──────────────────────────────────────────────────
    let units = segment::segment(&flat, config.strategy, config.min_unit_len);
    info!(
        "Segmented into {} units ({:?} strategy)",
        units.len(),
        config.strategy
    );
    if units.is_empty() {
        warn!("No text found in {}", input.display());
    }
    Ok(units)
}

/// Estimate what translating `units` will cost at `price_per_million_chars`.
pub fn estimate_cost(units: &[Unit], price_per_million_chars: f64) -> CostEstimate {
    let characters: usize = units.iter().map(|u| u.original.chars().count()).sum();
    CostEstimate {
        units: units.len(),
        characters,
        estimated_cost: characters as f64 / 1_000_000.0 * price_per_million_chars,
    }
}

/// Build the aligned table for `units` and render it to `output`.
///
/// Returns the number of pages written.
pub async fn write_table(
    units: &[Unit],
    output: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<usize, ReaderError> {
    let rows = table::build_rows(units, config.column_order);
    let header = config.header.then(|| {
        table::header_labels(config.column_order, &config.source_lang, &config.target_lang)
    });
    render::render_table(&rows, header, config.font_path.as_deref(), output.as_ref()).await
}

/// Translate a source document into a bilingual table PDF.
///
/// Resolves the backend from `config`, then runs
/// [`translate_document_with`].
///
/// A quota halt is not an error: the table is still written with the
/// units translated so far, and `run.halted` says why it stopped.
pub async fn translate_document(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<TranslationRun, ReaderError> {
    let backend = backend::resolve_backend(config)?;
    translate_document_with(backend.as_ref(), input, output, config).await
}

/// [`translate_document`] with a caller-supplied backend.
pub async fn translate_document_with(
    backend: &dyn TranslationBackend,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<TranslationRun, ReaderError> {
    let start = Instant::now();
    let units = prepare(input, config).await?;
    let run = translate_units(backend, units, config).await;

    if let Some(ref reason) = run.halted {
        warn!("Translation halted early: {:?}", reason);
    }

    let pages = write_table(&run.units, output.as_ref(), config).await?;
    info!(
        "Done: {} rows on {} pages in {}ms",
        run.units.len(),
        pages,
        start.elapsed().as_millis()
    );
    Ok(run)
}

/// Synchronous wrapper around [`translate_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_document_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<TranslationRun, ReaderError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReaderError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(translate_document(input, output, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentStrategy;
    use std::io::Write;

    #[test]
    fn estimate_counts_characters_not_bytes() {
        let units = vec![Unit::new(1, "Hello."), Unit::new(2, "Ærø ø.")];
        let est = estimate_cost(&units, 25.0);
        assert_eq!(est.units, 2);
        assert_eq!(est.characters, 12);
        assert!((est.estimated_cost - 12.0 * 25.0 / 1_000_000.0).abs() < 1e-12);
    }

    #[test]
    fn estimate_of_nothing_is_free() {
        let est = estimate_cost(&[], 25.0);
        assert_eq!(est.characters, 0);
        assert_eq!(est.estimated_cost, 0.0);
    }

    #[tokio::test]
    async fn prepare_text_source_by_speaker() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "JAMES: Hello\nthere.").unwrap();
        writeln!(file, "HERMIONE (smiling):   Hi James.").unwrap();
        writeln!(file, "RON: This line is past the limit.").unwrap();

        let config = ReaderConfig::builder()
            .limit(3)
            .strategy(SegmentStrategy::Speaker)
            .build()
            .unwrap();
        let units = prepare(file.path(), &config).await.unwrap();

        let originals: Vec<&str> = units.iter().map(|u| u.original.as_str()).collect();
        assert_eq!(
            originals,
            vec!["JAMES: Hello there.", "HERMIONE (smiling): Hi James."]
        );
    }

    #[tokio::test]
    async fn prepare_missing_file_is_fatal() {
        let config = ReaderConfig::default();
        let err = prepare("/definitely/not/here.txt", &config).await.unwrap_err();
        assert!(matches!(err, ReaderError::FileNotFound { .. }));
    }
}
