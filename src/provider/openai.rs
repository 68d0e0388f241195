//! OpenAI Chat Completions backend.
//!
//! The endpoint is overridable, so one client covers the hosted API and any
//! OpenAI-compatible local server.

use crate::error::RunError;
use crate::provider::{
    classify_http_failure, classify_transport_error, build_backend_http_client,
    GenerationBackend, GenerationOutcome, GenerationRequest,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiBackend {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(
        model: String,
        api_key: String,
        endpoint: Option<String>,
        temperature: Option<f32>,
        request_timeout: Duration,
    ) -> Result<Self, RunError> {
        let client = build_backend_http_client(request_timeout)?;
        let base_url = endpoint.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client,
            model,
            api_key,
            base_url,
            temperature,
        })
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &request.record_text,
                },
            ],
            max_tokens: request.max_output_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return classify_http_failure(status, &error_text);
        }

        let completion: ChatCompletionResponse = match response.json().await {
            Ok(c) => c,
            Err(e) => {
                return GenerationOutcome::Rejected(format!("failed to parse response: {}", e))
            }
        };

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                ceiling = request.max_output_tokens,
                "Chat completion call completed"
            );
        }

        let Some(choice) = completion.choices.into_iter().next() else {
            return GenerationOutcome::Rejected("no choices in response".to_string());
        };

        let text = choice.message.content.unwrap_or_default();
        if text.is_empty() {
            return GenerationOutcome::Rejected("response contained no text content".to_string());
        }

        match choice.finish_reason.as_deref() {
            Some("length") => GenerationOutcome::TruncatedSuccess(text),
            Some("content_filter") => {
                GenerationOutcome::Rejected("generation blocked by content filter".to_string())
            }
            _ => GenerationOutcome::Success(text),
        }
    }

    fn backend_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
