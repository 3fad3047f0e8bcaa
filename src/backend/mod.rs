//! Translation backends behind one capability.
//!
//! The translation loop only ever talks to [`TranslationBackend`]. Each
//! variant maps its own wire-level failures onto [`BackendError`], so the
//! retry, continue and halt policy in [`crate::pipeline::translate`] is the
//! same no matter which service does the translating.
//!
//! ```text
//!                  ┌──────────────┐
//! translate loop ─▶│  dyn Backend │──▶ DeepLBackend  (HTTP form POST)
//!                  └──────────────┘──▶ LlmBackend    (edgequake-llm chat)
//! ```

pub mod deepl;
pub mod llm;

use crate::config::{BackendKind, ReaderConfig};
use crate::error::{BackendError, ReaderError};
use async_trait::async_trait;
use std::sync::Arc;

pub use deepl::DeepLBackend;
pub use llm::LlmBackend;

/// A service that translates one unit of text per call.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Translate `text` from `source_lang` to `target_lang`.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError>;
}

#[async_trait]
impl<T: TranslationBackend + ?Sized> TranslationBackend for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        (**self).translate(text, source_lang, target_lang).await
    }
}

/// Construct the backend selected by `config.backend`.
pub fn resolve_backend(config: &ReaderConfig) -> Result<Arc<dyn TranslationBackend>, ReaderError> {
    match config.backend {
        BackendKind::DeepL => Ok(Arc::new(DeepLBackend::from_config(config)?)),
        BackendKind::Llm => Ok(Arc::new(LlmBackend::from_config(config)?)),
    }
}
