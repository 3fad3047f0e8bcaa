//! DeepL REST backend.
//!
//! One form-encoded `POST /v2/translate` per unit. The status code carries
//! most of the failure taxonomy:
//!
//! | Outcome                         | Mapped to                       |
//! |---------------------------------|---------------------------------|
//! | 2xx with `translations[0].text` | `Ok(text)`                      |
//! | 2xx without it                  | [`BackendError::InvalidResponse`] |
//! | 456, 429                        | [`BackendError::QuotaExceeded`] |
//! | other non-2xx                   | [`BackendError::Http`]          |
//! | connect failure / timeout       | [`BackendError::Transient`]     |

use super::TranslationBackend;
use crate::config::ReaderConfig;
use crate::error::{BackendError, ReaderError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Endpoint for DeepL API Free keys (suffix `:fx`).
pub const DEEPL_FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";
/// Endpoint for DeepL API Pro keys.
pub const DEEPL_PRO_ENDPOINT: &str = "https://api.deepl.com/v2/translate";
/// DeepL's status code for an exhausted character quota.
pub const QUOTA_EXCEEDED_STATUS: u16 = 456;
/// Too many requests. Halts the run like an exhausted quota.
pub const RATE_LIMITED_STATUS: u16 = 429;

/// Longest slice of an error body quoted in an error message.
const MAX_ERROR_BODY: usize = 200;

/// DeepL translation backend.
pub struct DeepLBackend {
    client: reqwest::Client,
    endpoint: String,
    auth_key: String,
}

impl DeepLBackend {
    /// Create a backend for `auth_key`, optionally overriding the endpoint.
    pub fn new(
        auth_key: impl Into<String>,
        endpoint: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ReaderError> {
        let auth_key = auth_key.into();
        let endpoint = endpoint.unwrap_or_else(|| endpoint_for_key(&auth_key).to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReaderError::ProviderNotConfigured {
                backend: "deepl".to_string(),
                hint: format!("HTTP client could not be created: {e}"),
            })?;

        debug!("DeepL endpoint: {}", endpoint);
        Ok(Self {
            client,
            endpoint,
            auth_key,
        })
    }

    /// Build from `config.api_key` / `config.deepl_endpoint`.
    pub fn from_config(config: &ReaderConfig) -> Result<Self, ReaderError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ReaderError::ProviderNotConfigured {
                backend: "deepl".to_string(),
                hint: "No DeepL authentication key. Set DEEPL_AUTH_KEY or pass --auth-key."
                    .to_string(),
            })?;
        Self::new(
            key.trim(),
            config.deepl_endpoint.clone(),
            config.request_timeout_secs,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TranslationBackend for DeepLBackend {
    fn name(&self) -> &str {
        "deepl"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        let source = source_lang.to_uppercase();
        let target = target_lang.to_uppercase();
        let form = [
            ("auth_key", self.auth_key.as_str()),
            ("text", text),
            ("source_lang", source.as_str()),
            ("target_lang", target.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_transport_error)?;
        interpret_response(status, &body)
    }
}

/// Pick the endpoint matching the key type.
pub fn endpoint_for_key(auth_key: &str) -> &'static str {
    if auth_key.trim_end().ends_with(":fx") {
        DEEPL_FREE_ENDPOINT
    } else {
        DEEPL_PRO_ENDPOINT
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    text: String,
}

/// Map a status code and body to a translation or a backend error.
pub(crate) fn interpret_response(status: u16, body: &str) -> Result<String, BackendError> {
    match status {
        QUOTA_EXCEEDED_STATUS => Err(BackendError::QuotaExceeded {
            detail: excerpt(body),
        }),
        RATE_LIMITED_STATUS => Err(BackendError::QuotaExceeded {
            detail: format!("HTTP 429 too many requests: {}", excerpt(body)),
        }),
        200..=299 => {
            let parsed: TranslateResponse =
                serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse {
                    detail: e.to_string(),
                })?;
            parsed
                .translations
                .into_iter()
                .next()
                .map(|t| t.text)
                .ok_or_else(|| BackendError::InvalidResponse {
                    detail: "empty translations array".to_string(),
                })
        }
        _ => Err(BackendError::Http {
            status,
            detail: excerpt(body),
        }),
    }
}

fn classify_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() || e.is_connect() {
        BackendError::Transient {
            detail: e.to_string(),
        }
    } else {
        BackendError::Other(e.to_string())
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_BODY {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}\u{2026}")
    } else {
        trimmed.to_string()
    }
}
