//! # parallel-reader
//!
//! Turn a PDF or plain-text book into a bilingual parallel-text PDF: every
//! sentence (or speaker turn) of the original next to its translation, in
//! a numbered table for language study.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source (.pdf / .txt)
//!  │
//!  ├─ 1. Extract    page text via pdfium (spawn_blocking) or raw lines
//!  ├─ 2. Normalize  form feeds → break marker, whitespace collapsed
//!  ├─ 3. Segment    sentences (with fragment merging) or speaker turns
//!  ├─ 4. Translate  one unit at a time: DeepL or an LLM, with cooldown,
//!  │                transient retry and a fail-fast quota halt
//!  ├─ 5. Table      aligned rows, column order, page layout
//!  └─ 6. Render     A4 table PDF, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parallel_reader::{translate_document, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReaderConfig::builder()
//!         .api_key(std::env::var("DEEPL_AUTH_KEY")?)
//!         .languages("EN", "DA")
//!         .build()?;
//!     let run = translate_document("book.pdf", "book_parallel.pdf", &config).await?;
//!     eprintln!(
//!         "{} translated, {} failed, {} not attempted",
//!         run.stats.translated, run.stats.failed, run.stats.not_attempted
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! A per-unit failure never aborts the run: the unit keeps a tagged
//! [`TranslationFailure`] that renders as a bracketed sentinel in its
//! cell. The one exception is quota exhaustion, which stops translating
//! but still writes the table with every unit translated so far.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `parallel-reader` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! parallel-reader = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{resolve_backend, DeepLBackend, LlmBackend, TranslationBackend};
pub use config::{
    BackendKind, ColumnOrder, PageMarker, ReaderConfig, ReaderConfigBuilder, SegmentStrategy,
};
pub use convert::{
    estimate_cost, prepare, translate_document, translate_document_sync, translate_document_with,
    translate_units, write_table,
};
pub use error::{BackendError, ReaderError};
pub use output::{
    CostEstimate, HaltReason, Row, RunStats, Translation, TranslationFailure, TranslationRun, Unit,
};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
