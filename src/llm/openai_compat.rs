//! OpenAI-compatible chat-completions provider (OpenRouter, DeepSeek, ...)

use super::streaming::{sse_stream, SseEvent};
use super::{GenerationConfig, LlmError, LlmProvider, LlmStream, Message, StreamChunk};
use crate::utils::http::{
    create_client, error_from_response, execute_with_retry, map_transport_error, HeaderBuilder,
    OpenRouterHeaders, RetryConfig, SharedHttpConfig,
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bearer-token authenticated chat-completions provider
pub struct OpenAiCompatibleProvider {
    name: String,
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamEvent {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    content: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Create a provider with default HTTP settings
    pub fn new(name: &str, api_key: String, base_url: String) -> Result<Self, LlmError> {
        Self::with_config(name, api_key, base_url, &SharedHttpConfig::default())
    }

    /// Create a provider with custom HTTP settings
    pub fn with_config(
        name: &str,
        api_key: String,
        base_url: String,
        http: &SharedHttpConfig,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            name: name.to_string(),
            client: create_client(http)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: http.timeout,
            retry: http.retry_config(),
        })
    }

    fn create_headers(&self) -> Result<HeaderMap, LlmError> {
        let invalid_key = |_| LlmError::MissingCredential {
            provider: self.name.clone(),
        };
        let mut builder = HeaderBuilder::new()
            .json_content_type()
            .bearer_auth(&self.api_key)
            .map_err(invalid_key)?;

        if self.base_url.contains("openrouter.ai") {
            builder = OpenRouterHeaders::new()
                .apply(builder)
                .map_err(|e| LlmError::Unknown {
                    message: format!("Invalid attribution header: {}", e),
                })?;
        }

        Ok(builder.build())
    }

    fn request_body<'a>(
        messages: &'a [Message],
        config: &'a GenerationConfig,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream,
        }
    }

    async fn send(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .json(&Self::request_body(messages, config, stream))
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response)
    }

    fn decode_event(event: &SseEvent) -> Result<Vec<StreamChunk>, LlmError> {
        let parsed: ChatStreamEvent = serde_json::from_str(&event.data)?;
        if let Some(error) = parsed.error {
            return Err(LlmError::InvalidResponse {
                message: format!("Provider error mid-stream: {}", error),
            });
        }

        let mut chunks = Vec::new();
        for choice in parsed.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                chunks.push(StreamChunk::content(content));
            }
            if let Some(reason) = choice.finish_reason {
                chunks.push(StreamChunk::finish(reason));
            }
        }
        Ok(chunks)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let operation = || async {
            let response = self.send(messages, config, false).await?;
            let body: ChatResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: format!("Failed to parse generation response: {}", e),
                })?;

            if let Some(error) = body.error {
                return Err(LlmError::InvalidResponse {
                    message: format!("Provider returned an error: {}", error),
                });
            }

            body.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| LlmError::InvalidResponse {
                    message: "No choices in response".to_string(),
                })
        };

        execute_with_retry(operation, &self.retry).await
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmStream, LlmError> {
        let response = self.send(messages, config, true).await?;
        tracing::debug!("{} stream opened for model {}", self.name, config.model);
        Ok(sse_stream(
            response.bytes_stream(),
            Self::decode_event,
            false,
            self.timeout,
        ))
    }
}
