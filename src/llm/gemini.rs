//! Google Gemini LLM provider implementation

use super::streaming::{sse_stream, SseEvent};
use super::{GenerationConfig, LlmError, LlmProvider, LlmStream, Message, MessageRole, StreamChunk};
use crate::utils::http::{
    create_client, error_from_response, execute_with_retry, map_transport_error, HeaderBuilder,
    RetryConfig, SharedHttpConfig,
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google Gemini API provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    retry: RetryConfig,
}

/// Gemini-specific request structures
#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response structures
#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

impl GeminiCandidate {
    fn text(&self) -> String {
        self.content
            .as_ref()
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider with default HTTP settings
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_config(
            api_key,
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
            &SharedHttpConfig::default(),
        )
    }

    /// Create a new Gemini provider with custom configuration
    pub fn with_config(
        api_key: String,
        base_url: String,
        http: &SharedHttpConfig,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: create_client(http)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: http.timeout,
            retry: http.retry_config(),
        })
    }

    fn create_headers(&self) -> Result<HeaderMap, LlmError> {
        HeaderBuilder::new()
            .json_content_type()
            .header("x-goog-api-key", &self.api_key)
            .map(HeaderBuilder::build)
            .map_err(|_| LlmError::MissingCredential {
                provider: "gemini".to_string(),
            })
    }

    /// Convert chat messages to Gemini format; system messages become the
    /// system instruction
    fn build_request(messages: &[Message], config: &GenerationConfig) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let part = GeminiPart {
                text: message.content.clone(),
            };
            match message.role {
                MessageRole::System => system_parts.push(part),
                MessageRole::User => contents.push(GeminiContent {
                    parts: vec![part],
                    role: Some("user".to_string()),
                }),
                MessageRole::Assistant => contents.push(GeminiContent {
                    parts: vec![part],
                    role: Some("model".to_string()),
                }),
            }
        }

        GeminiRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    parts: system_parts,
                    role: None,
                })
            },
            generation_config: GeminiGenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        }
    }

    async fn send(
        &self,
        url: String,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .json(&Self::build_request(messages, config))
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }

    fn decode_event(event: &SseEvent) -> Result<Vec<StreamChunk>, LlmError> {
        let parsed: GeminiResponse = serde_json::from_str(&event.data)?;
        let mut chunks = Vec::new();
        if let Some(candidate) = parsed.candidates.first() {
            let text = candidate.text();
            if !text.is_empty() {
                chunks.push(StreamChunk::content(text));
            }
            if let Some(reason) = &candidate.finish_reason {
                chunks.push(StreamChunk::finish(reason.to_lowercase()));
            }
        }
        Ok(chunks)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<String, LlmError> {
        let operation = || async {
            let url = format!("{}/models/{}:generateContent", self.base_url, config.model);
            let response = self.send(url, messages, config).await?;
            let body: GeminiResponse =
                response
                    .json()
                    .await
                    .map_err(|e| LlmError::InvalidResponse {
                        message: format!("Failed to parse Gemini response: {}", e),
                    })?;

            body.candidates
                .first()
                .map(GeminiCandidate::text)
                .ok_or_else(|| LlmError::InvalidResponse {
                    message: "No candidates in response".to_string(),
                })
        };

        execute_with_retry(operation, &self.retry).await
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmStream, LlmError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, config.model
        );
        let response = self.send(url, messages, config).await?;
        Ok(sse_stream(
            response.bytes_stream(),
            Self::decode_event,
            true,
            self.timeout,
        ))
    }
}
