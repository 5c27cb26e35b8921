//! LLM provider abstraction and implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ProviderKind};
use crate::utils::config::ApiKeyResolver;
use crate::utils::http::SharedHttpConfig;

pub mod connection;
pub mod gemini;
pub mod openai_compat;
pub mod prompts;
pub mod streaming;

#[cfg(test)]
pub mod testing;

pub use prompts::{PromptContext, PromptTemplate, PromptTemplates};
pub use streaming::{LlmStream, SseParser, StreamChunk};

/// Error types for LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Missing API credential for provider {provider}")]
    MissingCredential { provider: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Request failed: {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl LlmError {
    /// Short name of the failure kind, stable for callers and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::Network(e) if e.is_timeout() => "timeout",
            Self::Network(_) => "network_failure",
            Self::Timeout { .. } => "timeout",
            Self::RequestFailed { .. } => "non_success_status",
            Self::InvalidResponse { .. } | Self::Serialization(_) => "invalid_response",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Represents a message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Configuration for LLM generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            temperature: Some(0.7),
            max_tokens: Some(2048),
        }
    }
}

/// The provider trait every AI backend implements.
///
/// Blocking calls return the full assistant text. Streaming calls return an
/// [`LlmStream`] whose last item is a final chunk; the HTTP response is owned
/// by the stream, so dropping it aborts the request.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openrouter", "gemini")
    fn provider_name(&self) -> &str;

    /// Generate a complete response
    async fn generate(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<String, LlmError>;

    /// Generate a streaming response
    async fn generate_stream(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmStream, LlmError>;
}

/// Factory for creating LLM providers
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the provider selected by the configuration
    pub fn from_config(config: &Config) -> Result<Box<dyn LlmProvider>, LlmError> {
        Self::create_provider(config, &config.active_provider)
    }

    /// Create a provider by name
    pub fn create_provider(
        config: &Config,
        provider_name: &str,
    ) -> Result<Box<dyn LlmProvider>, LlmError> {
        let provider_config = config.provider(provider_name);
        let api_key = ApiKeyResolver::resolve_api_key(
            provider_name,
            provider_config.and_then(|p| p.api_key.as_deref()),
        )
        .ok_or_else(|| LlmError::MissingCredential {
            provider: provider_name.to_string(),
        })?;

        let kind = ProviderKind::for_provider(provider_name, provider_config);
        let base_url = config.base_url_for(provider_name);
        let http = SharedHttpConfig::from(&config.http);

        match kind {
            ProviderKind::OpenAiCompatible => Ok(Box::new(
                openai_compat::OpenAiCompatibleProvider::with_config(
                    provider_name,
                    api_key,
                    base_url,
                    &http,
                )?,
            )),
            ProviderKind::Gemini => Ok(Box::new(gemini::GeminiProvider::with_config(
                api_key, base_url, &http,
            )?)),
        }
    }

    /// List all built-in provider names
    pub fn list_providers() -> Vec<&'static str> {
        vec!["openrouter", "deepseek", "gemini"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LlmError::MissingCredential {
                provider: "x".to_string()
            }
            .kind(),
            "missing_credential"
        );
        assert_eq!(LlmError::Timeout { timeout_ms: 5 }.kind(), "timeout");
        let failed = LlmError::RequestFailed {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(failed.kind(), "non_success_status");
        assert!(failed.is_transient());
        assert!(!LlmError::RequestFailed {
            status: 401,
            message: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_factory_requires_credential() {
        let mut config = Config::default();
        config.active_provider = "codepad_factory_test".to_string();
        std::env::remove_var("CODEPAD_FACTORY_TEST_API_KEY");

        match LlmProviderFactory::from_config(&config) {
            Err(LlmError::MissingCredential { provider }) => {
                assert_eq!(provider, "codepad_factory_test")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("provider created without a key"),
        }
    }

    #[test]
    fn test_factory_selects_gemini_by_name() {
        let mut config = Config::default();
        config.providers.insert(
            "gemini".to_string(),
            crate::config::ProviderConfig {
                api_key: Some("test-key".to_string()),
                ..Default::default()
            },
        );
        let provider = LlmProviderFactory::create_provider(&config, "gemini").unwrap();
        assert_eq!(provider.provider_name(), "gemini");
    }
}
