//! Error types for the parallel-reader library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReaderError`] — **Fatal**: the run cannot proceed at all (unreadable
//!   source, unsupported format, backend not configured, output not
//!   writable). Returned as `Err(ReaderError)` from the top-level entry points.
//!
//! * [`BackendError`] — **Per request**: a single translation call failed.
//!   The translation loop decides what each kind means for the run (retry,
//!   record a sentinel and continue, or halt) and stores the outcome on the
//!   unit as [`crate::output::TranslationFailure`]. It never aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the parallel-reader library.
#[derive(Debug, Error)]
pub enum ReaderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is neither `.pdf` nor `.txt`.
    #[error("Unsupported source format '{path}': expected a .pdf or .txt file")]
    UnsupportedFormat { path: PathBuf },

    /// The source exists but its text could not be extracted.
    #[error("Failed to extract text from '{path}': {detail}")]
    Extraction { path: PathBuf, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium (or pdfium.dll),\n\
or install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// pdfium rejected an operation while drawing the output table.
    #[error("Failed to render output document: {0}")]
    RenderFailed(String),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The configured backend cannot be constructed (missing key, unknown provider).
    #[error("Translation backend '{backend}' is not configured.\n{hint}")]
    ProviderNotConfigured { backend: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure of one translation request.
///
/// Every backend maps its own failures onto these kinds so the translation
/// loop can apply a single policy regardless of which backend is in use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The account quota is exhausted or the backend is rate limiting
    /// (DeepL HTTP 456 / 429). Halts the run.
    #[error("quota exceeded: {detail}")]
    QuotaExceeded { detail: String },

    /// Connection failure or timeout. The same unit is retried.
    #[error("transient network error: {detail}")]
    Transient { detail: String },

    /// The backend answered, but not with the payload we expect.
    #[error("invalid response: {detail}")]
    InvalidResponse { detail: String },

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Whether the same request should be attempted again after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_display_names_path_and_cause() {
        let e = ReaderError::Extraction {
            path: PathBuf::from("book.pdf"),
            detail: "xref table corrupt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("book.pdf"), "got: {msg}");
        assert!(msg.contains("xref table corrupt"), "got: {msg}");
    }

    #[test]
    fn http_display_includes_status() {
        let e = BackendError::Http {
            status: 403,
            detail: "Forbidden".into(),
        };
        assert_eq!(e.to_string(), "HTTP 403: Forbidden");
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(BackendError::Transient {
            detail: "timed out".into()
        }
        .is_transient());
        assert!(!BackendError::QuotaExceeded {
            detail: "456".into()
        }
        .is_transient());
        assert!(!BackendError::Other("boom".into()).is_transient());
    }

    #[test]
    fn provider_not_configured_display() {
        let e = ReaderError::ProviderNotConfigured {
            backend: "deepl".into(),
            hint: "Set DEEPL_AUTH_KEY".into(),
        };
        assert!(e.to_string().contains("deepl"));
        assert!(e.to_string().contains("DEEPL_AUTH_KEY"));
    }
}
