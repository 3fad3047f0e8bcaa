//! Data carried between pipeline stages and returned to callers.
//!
//! A [`Unit`] is created once by the segmenter and keeps its index for the
//! whole run. The translation loop only ever fills in [`Unit::translation`];
//! the table builder reads units back in index order.

use crate::error::BackendError;
use serde::{Deserialize, Serialize};

/// Display text for a failed translation of any kind not listed below.
pub const SENTINEL_TRANSLATION_ERROR: &str = "[Translation Error]";
/// Display text for the unit that hit the backend quota.
pub const SENTINEL_QUOTA_EXCEEDED: &str = "[Translation Error: Quota exceeded]";
/// Display text for a response missing the expected fields.
pub const SENTINEL_INVALID_RESPONSE: &str = "[Invalid API Response]";

/// One translatable segment of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// 1-based position in the segmented sequence.
    pub index: usize,
    /// Source-language text; never empty.
    pub original: String,
    pub translation: Translation,
}

impl Unit {
    pub fn new(index: usize, original: impl Into<String>) -> Self {
        Self {
            index,
            original: original.into(),
            translation: Translation::Pending,
        }
    }
}

/// Translation state of a unit.
///
/// Failures are kept as a tagged variant so a source sentence that happens
/// to contain bracketed text can never be mistaken for an error marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Translation {
    /// Not attempted (yet, or ever, if the run halted first).
    Pending,
    Translated(String),
    Failed(TranslationFailure),
}

impl Translation {
    /// Text to put in the translation cell.
    pub fn display_text(&self) -> &str {
        match self {
            Translation::Pending => "",
            Translation::Translated(text) => text,
            Translation::Failed(failure) => failure.sentinel(),
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Translation::Translated(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Translation::Failed(_))
    }
}

/// Why a unit has no translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationFailure {
    /// HTTP error, exhausted retries, or any other backend failure.
    Generic,
    QuotaExceeded,
    InvalidResponse,
}

impl TranslationFailure {
    pub fn sentinel(&self) -> &'static str {
        match self {
            TranslationFailure::Generic => SENTINEL_TRANSLATION_ERROR,
            TranslationFailure::QuotaExceeded => SENTINEL_QUOTA_EXCEEDED,
            TranslationFailure::InvalidResponse => SENTINEL_INVALID_RESPONSE,
        }
    }
}

impl From<&BackendError> for TranslationFailure {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::QuotaExceeded { .. } => TranslationFailure::QuotaExceeded,
            BackendError::InvalidResponse { .. } => TranslationFailure::InvalidResponse,
            BackendError::Transient { .. } | BackendError::Http { .. } | BackendError::Other(_) => {
                TranslationFailure::Generic
            }
        }
    }
}

/// One rendered table row: the unit number and the two text columns in
/// the configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub number: usize,
    pub first: String,
    pub second: String,
}

/// Why a translation run stopped before the last unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// The backend reported quota exhaustion while translating `unit`.
    QuotaExceeded { unit: usize, detail: String },
}

/// Result of the translation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRun {
    /// Every segmented unit in index order, including ones never attempted.
    pub units: Vec<Unit>,
    /// Set when the run stopped early.
    pub halted: Option<HaltReason>,
    pub stats: RunStats,
}

/// Counters for one translation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_units: usize,
    pub translated: usize,
    pub failed: usize,
    pub not_attempted: usize,
    /// Retries after transient failures, summed over all units.
    pub retries: u64,
    /// Characters of source text sent to the backend.
    pub characters: usize,
    pub duration_ms: u64,
}

impl RunStats {
    /// Recount the per-state totals from the final unit list.
    pub(crate) fn tally(&mut self, units: &[Unit]) {
        self.total_units = units.len();
        self.translated = units.iter().filter(|u| u.translation.is_translated()).count();
        self.failed = units.iter().filter(|u| u.translation.is_failed()).count();
        self.not_attempted = units
            .iter()
            .filter(|u| u.translation == Translation::Pending)
            .count();
    }
}

/// Pre-flight estimate shown before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub units: usize,
    pub characters: usize,
    pub estimated_cost: f64,
}
