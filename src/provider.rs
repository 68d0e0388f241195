//! Generation Backend Abstraction
//!
//! Unified interface for external text-generation providers (Anthropic, and
//! OpenAI-compatible endpoints including local servers). The orchestrator
//! depends only on the four-way outcome contract exposed here; everything
//! wire-level stays inside the concrete backends.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

use crate::error::RunError;

/// The assembled payload for one external generation call.
///
/// The instruction template and record text are never mutated to fit a
/// smaller ceiling — only `max_output_tokens` changes between attempts.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fixed instruction template, sent as the system prompt.
    pub instructions: String,
    /// Serialized proposal record, sent as the user message.
    pub record_text: String,
    /// Declared upper bound on generated output, in provider tokens.
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// Same request at a different rung of the ceiling ladder.
    pub fn with_ceiling(&self, max_output_tokens: u32) -> Self {
        Self {
            instructions: self.instructions.clone(),
            record_text: self.record_text.clone(),
            max_output_tokens,
        }
    }
}

/// Result of one generation attempt. Exactly one of the four states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Clean completion.
    Success(String),
    /// Completed but hit the declared output ceiling; text is present but
    /// possibly incomplete.
    TruncatedSuccess(String),
    /// Failed in a way a smaller ceiling cannot fix (policy block, malformed
    /// request, auth, unrelated transport error).
    Rejected(String),
    /// Failed in a way consistent with the ceiling being too large for the
    /// service to honor; the ladder may descend and retry.
    RetryableFailure(String),
}

/// A pluggable generation backend: request in, four-way outcome out.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome;

    fn backend_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Supported provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
}

/// One provider definition from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    pub model: String,

    /// Explicit API key; falls back to the provider's conventional
    /// environment variable when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint override. For OpenAI-type providers this points the client at
    /// any compatible server (Azure, local). Ignored by Anthropic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature {} outside 0.0-2.0", t));
            }
        }
        Ok(())
    }

    /// Environment variable consulted when no explicit API key is configured.
    pub fn api_key_env_var(provider_type: ProviderType) -> &'static str {
        match provider_type {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(Self::api_key_env_var(self.provider_type)).ok())
    }
}

const BACKEND_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_backend_http_client(request_timeout: Duration) -> Result<Client, RunError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(BACKEND_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| RunError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Map a reqwest transport error to an outcome per the classification rule:
/// timeouts and size-suggestive failures are retryable, everything else is a
/// rejection (shrinking the ceiling would not address it).
pub(crate) fn classify_transport_error(error: &reqwest::Error) -> GenerationOutcome {
    if error.is_timeout() {
        GenerationOutcome::RetryableFailure(format!("request timed out: {}", error))
    } else if message_suggests_oversize(&error.to_string()) {
        GenerationOutcome::RetryableFailure(format!("transport error: {}", error))
    } else {
        GenerationOutcome::Rejected(format!("transport error: {}", error))
    }
}

/// Map a non-success HTTP status plus response body to an outcome.
pub(crate) fn classify_http_failure(status: StatusCode, body: &str) -> GenerationOutcome {
    let detail = format!("status {}: {}", status.as_u16(), body);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return GenerationOutcome::RetryableFailure(detail);
    }
    // Overload statuses are treated as "too much to service right now";
    // descending the ladder shrinks the request's declared work.
    if status.as_u16() == 529 || status == StatusCode::SERVICE_UNAVAILABLE {
        return GenerationOutcome::RetryableFailure(detail);
    }
    if message_suggests_oversize(body) {
        return GenerationOutcome::RetryableFailure(detail);
    }
    GenerationOutcome::Rejected(detail)
}

/// Heuristic for "the request or expected response was too large".
fn message_suggests_oversize(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "too large",
        "too long",
        "too many tokens",
        "exceeds",
        "exceeded",
        "context length",
        "max_tokens",
        "overloaded",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

/// Backend factory keyed by provider configuration.
pub struct BackendFactory;

impl BackendFactory {
    pub fn create(
        name: &str,
        config: &ProviderConfig,
        request_timeout: Duration,
    ) -> Result<Box<dyn GenerationBackend>, RunError> {
        config
            .validate()
            .map_err(|e| RunError::ConfigError(format!("Provider '{}': {}", name, e)))?;

        match config.provider_type {
            ProviderType::Anthropic => {
                let api_key = config.resolve_api_key().ok_or_else(|| {
                    RunError::ProviderNotConfigured(format!(
                        "provider '{}' has no API key (set api_key or {})",
                        name,
                        ProviderConfig::api_key_env_var(ProviderType::Anthropic)
                    ))
                })?;
                Ok(Box::new(AnthropicBackend::new(
                    config.model.clone(),
                    api_key,
                    config.temperature,
                    request_timeout,
                )?))
            }
            ProviderType::OpenAI => {
                let api_key = config.resolve_api_key().ok_or_else(|| {
                    RunError::ProviderNotConfigured(format!(
                        "provider '{}' has no API key (set api_key or {})",
                        name,
                        ProviderConfig::api_key_env_var(ProviderType::OpenAI)
                    ))
                })?;
                Ok(Box::new(OpenAiBackend::new(
                    config.model.clone(),
                    api_key,
                    config.endpoint.clone(),
                    config.temperature,
                    request_timeout,
                )?))
            }
        }
    }
}
