//! Configuration types for a parallel-text run.
//!
//! Every knob lives in [`ReaderConfig`], built via [`ReaderConfigBuilder`].
//! The config is passed explicitly into each stage; nothing in the library
//! reads process-wide settings except the provider auto-detection fallbacks
//! documented on [`ReaderConfig::provider_name`].

use crate::error::ReaderError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Placeholder substituted with the 1-based page number in a custom marker.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Configuration for one source document → bilingual table run.
///
/// # Example
/// ```rust
/// use parallel_reader::{ReaderConfig, SegmentStrategy};
/// use std::time::Duration;
///
/// let config = ReaderConfig::builder()
///     .languages("EN", "DE")
///     .strategy(SegmentStrategy::Speaker)
///     .cooldown(Duration::from_millis(200))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReaderConfig {
    /// Maximum number of pages (PDF) or lines (plain text) to read. Default: 151.
    ///
    /// Anything beyond the limit is silently ignored.
    pub limit: usize,

    /// Marker appended after each non-empty PDF page. Default: [`PageMarker::Dashes`].
    pub page_marker: PageMarker,

    /// Replacement for form-feed page breaks inside page text. Default: `;;;;`.
    pub break_marker: String,

    /// How the normalised text is cut into units. Default: [`SegmentStrategy::Sentence`].
    pub strategy: SegmentStrategy,

    /// Sentence pieces shorter than this (in characters) are appended to the
    /// previous unit. Default: 6.
    pub min_unit_len: usize,

    /// Which translation backend to call. Default: [`BackendKind::DeepL`].
    pub backend: BackendKind,

    /// DeepL authentication key.
    pub api_key: Option<String>,

    /// Override the DeepL endpoint URL. If None, chosen from the key type.
    pub deepl_endpoint: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini", "ollama").
    ///
    /// If neither this nor `provider` is set, `EDGEQUAKE_LLM_PROVIDER` +
    /// `EDGEQUAKE_MODEL` are consulted, then `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM backend. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per unit. Default: 1024.
    pub max_tokens: usize,

    /// Source language code or name. Default: "EN".
    pub source_lang: String,

    /// Target language code or name. Default: "DA".
    pub target_lang: String,

    /// Delay between consecutive translation requests. Default: 1 s.
    pub cooldown: Duration,

    /// Delay before retrying a unit after a transient failure. Default: 5 s.
    pub retry_backoff: Duration,

    /// Retries per unit on transient failure. Default: `Some(5)`.
    /// `None` retries until the unit resolves.
    pub max_retries: Option<u32>,

    /// Per-request HTTP timeout in seconds (DeepL backend). Default: 30.
    pub request_timeout_secs: u64,

    /// Which text goes in the first column. Default: [`ColumnOrder::TranslationFirst`].
    pub column_order: ColumnOrder,

    /// Draw a header row at the top of every output page. Default: false.
    pub header: bool,

    /// TrueType font embedded in the output. If None, Helvetica is used,
    /// which only covers Latin-1 text.
    pub font_path: Option<PathBuf>,

    /// Price per million source characters for the pre-flight estimate. Default: 25.0.
    pub price_per_million_chars: f64,

    /// Optional per-unit progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            limit: 151,
            page_marker: PageMarker::default(),
            break_marker: ";;;;".to_string(),
            strategy: SegmentStrategy::default(),
            min_unit_len: 6,
            backend: BackendKind::default(),
            api_key: None,
            deepl_endpoint: None,
            provider_name: None,
            model: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 1024,
            source_lang: "EN".to_string(),
            target_lang: "DA".to_string(),
            cooldown: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(5),
            max_retries: Some(5),
            request_timeout_secs: 30,
            column_order: ColumnOrder::default(),
            header: false,
            font_path: None,
            price_per_million_chars: 25.0,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("limit", &self.limit)
            .field("page_marker", &self.page_marker)
            .field("break_marker", &self.break_marker)
            .field("strategy", &self.strategy)
            .field("min_unit_len", &self.min_unit_len)
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("deepl_endpoint", &self.deepl_endpoint)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("cooldown", &self.cooldown)
            .field("retry_backoff", &self.retry_backoff)
            .field("max_retries", &self.max_retries)
            .field("column_order", &self.column_order)
            .field("header", &self.header)
            .field("font_path", &self.font_path)
            .finish()
    }
}

impl ReaderConfig {
    /// Create a new builder for `ReaderConfig`.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn limit(mut self, n: usize) -> Self {
        self.config.limit = n;
        self
    }

    pub fn page_marker(mut self, marker: PageMarker) -> Self {
        self.config.page_marker = marker;
        self
    }

    pub fn break_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.break_marker = marker.into();
        self
    }

    pub fn strategy(mut self, strategy: SegmentStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn min_unit_len(mut self, n: usize) -> Self {
        self.config.min_unit_len = n;
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn deepl_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.deepl_endpoint = Some(url.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.config.source_lang = source.into();
        self.config.target_lang = target.into();
        self
    }

    pub fn cooldown(mut self, delay: Duration) -> Self {
        self.config.cooldown = delay;
        self
    }

    pub fn retry_backoff(mut self, delay: Duration) -> Self {
        self.config.retry_backoff = delay;
        self
    }

    pub fn max_retries(mut self, n: Option<u32>) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn column_order(mut self, order: ColumnOrder) -> Self {
        self.config.column_order = order;
        self
    }

    pub fn header(mut self, v: bool) -> Self {
        self.config.header = v;
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn price_per_million_chars(mut self, price: f64) -> Self {
        self.config.price_per_million_chars = price;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, ReaderError> {
        let c = &self.config;
        if c.limit == 0 {
            return Err(ReaderError::InvalidConfig(
                "Page/line limit must be ≥ 1".into(),
            ));
        }
        if c.source_lang.trim().is_empty() || c.target_lang.trim().is_empty() {
            return Err(ReaderError::InvalidConfig(
                "Source and target language must not be empty".into(),
            ));
        }
        if let PageMarker::Custom(template) = &c.page_marker {
            if !template.contains(PAGE_PLACEHOLDER) {
                return Err(ReaderError::InvalidConfig(format!(
                    "Custom page marker must contain {PAGE_PLACEHOLDER}, got {template:?}"
                )));
            }
        }
        if c.break_marker.chars().any(char::is_whitespace) || c.break_marker.is_empty() {
            return Err(ReaderError::InvalidConfig(format!(
                "Break marker must be non-empty and contain no whitespace, got {:?}",
                c.break_marker
            )));
        }
        if !c.price_per_million_chars.is_finite() || c.price_per_million_chars < 0.0 {
            return Err(ReaderError::InvalidConfig(format!(
                "Price per million characters must be ≥ 0, got {}",
                c.price_per_million_chars
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the normalised text stream is split into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentStrategy {
    /// Split after `.`, `!` or `?`, merging short fragments into the previous unit. (default)
    #[default]
    Sentence,
    /// Split before every speaker tag such as `JAMES:` or `HERMIONE (smiling):`.
    Speaker,
}

/// Which translation service handles each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// DeepL REST API. (default)
    #[default]
    DeepL,
    /// A generative model asked to translate through a fixed prompt.
    Llm,
}

/// Order of the two text columns in the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnOrder {
    OriginalFirst,
    /// Translation in the first column, original in the second. (default)
    #[default]
    TranslationFirst,
}

/// Marker recording which source page a block of text came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageMarker {
    /// `| ---- N ---- |` (default)
    #[default]
    Dashes,
    /// `IIII: ~~~~~  N  ~~~~~`
    Tildes,
    /// Custom template; `{page}` is replaced with the page number.
    Custom(String),
}

impl PageMarker {
    /// Render the marker for the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageMarker::Dashes => format!("| ---- {} ---- |", page_num),
            PageMarker::Tildes => format!("IIII: ~~~~~  {}  ~~~~~", page_num),
            PageMarker::Custom(template) => {
                template.replace(PAGE_PLACEHOLDER, &page_num.to_string())
            }
        }
    }
}
