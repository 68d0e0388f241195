//! Anthropic Messages API backend.

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

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: Client,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicBackend {
    pub fn new(
        model: String,
        api_key: String,
        temperature: Option<f32>,
        request_timeout: Duration,
    ) -> Result<Self, RunError> {
        let client = build_backend_http_client(request_timeout)?;
        Ok(Self {
            client,
            model,
            api_key,
            temperature,
        })
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_output_tokens,
            system: &request.instructions,
            messages: vec![Message {
                role: "user",
                content: &request.record_text,
            }],
            temperature: self.temperature,
        };

        let response = match self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        let completion: MessagesResponse = match response.json().await {
            Ok(c) => c,
            Err(e) => {
                return GenerationOutcome::Rejected(format!("failed to parse response: {}", e))
            }
        };

        if let Some(usage) = &completion.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                ceiling = request.max_output_tokens,
                "Anthropic call completed"
            );
        }

        let text: String = completion
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();

        if text.is_empty() {
            return GenerationOutcome::Rejected("response contained no text content".to_string());
        }

        match completion.stop_reason.as_deref() {
            Some("max_tokens") => GenerationOutcome::TruncatedSuccess(text),
            Some("refusal") => {
                GenerationOutcome::Rejected("generation refused by provider policy".to_string())
            }
            _ => GenerationOutcome::Success(text),
        }
    }

    fn backend_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_ceiling_as_max_tokens() {
        let body = MessagesRequest {
            model: "claude-sonnet-4-5",
            max_tokens: 32000,
            system: "instructions",
            messages: vec![Message {
                role: "user",
                content: "record",
            }],
            temperature: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 32000);
        assert_eq!(json["system"], "instructions");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_stop_reason_deserializes() {
        let raw = r#"{
            "content": [{"type": "text", "text": "<html></html>"}],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 10, "output_tokens": 32000}
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.stop_reason.as_deref(), Some("max_tokens"));
        assert_eq!(parsed.content[0].text.as_deref(), Some("<html></html>"));
    }
}
