//! Generative-model backend: translation through a fixed instruction prompt.
//!
//! The request contains a system message naming the language pair (see
//! [`crate::prompts`]) and a user message with the unit text. The reply is
//! taken as the translation after trimming.
//!
//! Provider failures arrive as a typed [`LlmError`] and are mapped onto the
//! same [`BackendError`] kinds DeepL uses:
//!
//! | `LlmError`                        | Mapped to                          |
//! |-----------------------------------|------------------------------------|
//! | `RateLimited`                     | [`BackendError::QuotaExceeded`]    |
//! | `Timeout`, `NetworkError`         | [`BackendError::Transient`]        |
//! | `SerializationError`              | [`BackendError::InvalidResponse`]  |
//! | anything else                     | [`BackendError::Other`]            |

use super::TranslationBackend;
use crate::config::ReaderConfig;
use crate::error::{BackendError, ReaderError};
use crate::prompts;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Translation backend driving an `edgequake-llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Resolve the provider from the config and environment.
    pub fn from_config(config: &ReaderConfig) -> Result<Self, ReaderError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config.temperature, config.max_tokens))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TranslationBackend for LlmBackend {
    fn name(&self) -> &str {
        "llm"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        let messages = vec![
            ChatMessage::system(prompts::system_prompt(source_lang, target_lang)),
            ChatMessage::user(prompts::user_prompt(text)),
        ];
        let options = self.options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| classify_error(&e))?;

        debug!(
            "LLM reply: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        let translation = response.content.trim();
        if translation.is_empty() {
            return Err(BackendError::InvalidResponse {
                detail: "model returned an empty reply".to_string(),
            });
        }
        Ok(translation.to_string())
    }
}

/// Map a provider error onto a [`BackendError`] kind by variant.
pub(crate) fn classify_error(err: &LlmError) -> BackendError {
    let detail = err.to_string();
    match err {
        LlmError::RateLimited(_) => BackendError::QuotaExceeded { detail },
        LlmError::Timeout | LlmError::NetworkError(_) => BackendError::Transient { detail },
        LlmError::SerializationError(_) => BackendError::InvalidResponse { detail },
        _ => BackendError::Other(detail),
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`).
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &ReaderConfig) -> Result<Arc<dyn LLMProvider>, ReaderError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReaderError::ProviderNotConfigured {
            backend: "llm".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReaderError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReaderError::ProviderNotConfigured {
            backend: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
