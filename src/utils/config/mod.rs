//! Shared configuration access helpers

use crate::config::{Config, ProviderConfig};

/// Centralized API key resolution logic
pub struct ApiKeyResolver;

impl ApiKeyResolver {
    /// Get API key for provider with environment variable precedence
    pub fn resolve_api_key(provider_name: &str, config_api_key: Option<&str>) -> Option<String> {
        let env_key = Self::env_key_name(provider_name);
        if let Ok(api_key) = std::env::var(&env_key) {
            if !api_key.trim().is_empty() {
                return Some(api_key);
            }
        }

        config_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|s| s.to_string())
    }

    /// Get environment variable name for provider
    pub fn env_key_name(provider_name: &str) -> String {
        format!(
            "{}_API_KEY",
            provider_name.to_uppercase().replace('-', "_")
        )
    }

    /// Resolve the key for the active provider of a configuration
    pub fn active_api_key(config: &Config) -> Option<String> {
        Self::resolve_api_key(
            &config.active_provider,
            config
                .active_provider_config()
                .and_then(|p: &ProviderConfig| p.api_key.as_deref()),
        )
    }
}
