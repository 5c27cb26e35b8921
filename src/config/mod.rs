//! Configuration management for codepad

use crate::llm::GenerationConfig;
use crate::utils::errors::{CodepadError, ConfigError};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Model used when neither the provider nor the generation section names one
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Currently active LLM provider
    pub active_provider: String,
    /// Provider configurations
    pub providers: HashMap<String, ProviderConfig>,
    /// Generation defaults shared by every provider
    pub generation: GenerationSettings,
    /// Session lifecycle settings
    pub session: SessionConfig,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Bearer-token JSON chat-completions endpoint (OpenRouter, DeepSeek, ...)
    OpenAiCompatible,
    /// Google Gemini `generateContent` API
    Gemini,
}

impl ProviderKind {
    /// Resolve the kind for a provider, falling back on its well-known name
    pub fn for_provider(name: &str, config: Option<&ProviderConfig>) -> Self {
        if let Some(kind) = config.and_then(|c| c.kind) {
            return kind;
        }
        match name.to_lowercase().as_str() {
            "gemini" => Self::Gemini,
            _ => Self::OpenAiCompatible,
        }
    }

    /// Base URL used when the provider config does not set one
    pub fn default_base_url(&self, name: &str) -> &'static str {
        match (self, name.to_lowercase().as_str()) {
            (Self::Gemini, _) => "https://generativelanguage.googleapis.com/v1beta",
            (Self::OpenAiCompatible, "deepseek") => "https://api.deepseek.com/v1",
            (Self::OpenAiCompatible, _) => "https://openrouter.ai/api/v1",
        }
    }
}

/// Configuration for an LLM provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key for the provider; `<NAME>_API_KEY` takes precedence
    pub api_key: Option<String>,
    /// Base URL for the provider API
    pub base_url: Option<String>,
    /// Model to use with this provider
    pub model: Option<String>,
    /// Protocol override for providers not known by name
    pub kind: Option<ProviderKind>,
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a session is discarded
    pub ttl_minutes: u64,
    /// Number of stored turns replayed into each chat prompt
    pub history_window: usize,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request-level timeout for provider calls
    pub timeout_secs: u64,
    /// Retries for transient provider failures (blocking calls only)
    pub retry_attempts: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_provider: "openrouter".to_string(),
            providers: HashMap::new(),
            generation: GenerationSettings::default(),
            session: SessionConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            history_window: 10,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            retry_attempts: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes * 60)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Get a provider configuration
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Get the active provider configuration
    pub fn active_provider_config(&self) -> Option<&ProviderConfig> {
        self.provider(&self.active_provider)
    }

    /// Configured base URL for a provider, or its well-known default
    pub fn base_url_for(&self, name: &str) -> String {
        let provider = self.provider(name);
        provider
            .and_then(|p| p.base_url.clone())
            .unwrap_or_else(|| {
                ProviderKind::for_provider(name, provider)
                    .default_base_url(name)
                    .to_string()
            })
    }

    /// Model for the active provider: provider entry, then generation section,
    /// then the provider's well-known default
    pub fn active_model(&self) -> String {
        self.active_provider_config()
            .and_then(|p| p.model.clone())
            .or_else(|| self.generation.model.clone())
            .unwrap_or_else(|| default_model_for(&self.active_provider).to_string())
    }

    /// Generation parameters for the active provider
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.active_model(),
            temperature: Some(self.generation.temperature),
            max_tokens: Some(self.generation.max_tokens),
        }
    }

    /// Check if the configuration is valid
    pub fn validate(&self) -> Result<()> {
        if self.active_provider.trim().is_empty() {
            return Err(CodepadError::validation(
                "active_provider",
                "No active provider configured",
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "generation.temperature".to_string(),
                value: self.generation.temperature.to_string(),
            }
            .into());
        }

        if self.generation.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "generation.max_tokens".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.session.history_window == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.history_window".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Well-known default model per provider name
pub fn default_model_for(provider_name: &str) -> &'static str {
    match provider_name.to_lowercase().as_str() {
        "deepseek" => "deepseek-chat",
        "gemini" => "gemini-1.5-flash",
        _ => DEFAULT_MODEL,
    }
}

/// Configuration manager for loading and saving application configuration
pub struct ConfigManager {
    config: Config,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load configuration from `path`, or the default location when `None`.
    /// A missing file yields the default configuration.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            tracing::debug!("No configuration at {}, using defaults", config_path.display());
            Config::default()
        };
        config.validate()?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Path the configuration is read from and saved to
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        Self::save_config(&self.config_path, &self.config)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::FileNotFound {
            path: PathBuf::from("config directory"),
        })?;
        Ok(config_dir.join("codepad").join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError { source: e })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError { source: e })
            .map_err(Into::into)
    }

    fn save_config(path: &Path, config: &Config) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError { source: e })?;
            }
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError { source: e })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::load(Some(dir.path().join("none.toml"))).unwrap();
        assert_eq!(manager.config().active_provider, "openrouter");
        assert_eq!(manager.config().session.history_window, 10);
        assert_eq!(manager.config().active_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut manager = ConfigManager::load(Some(path.clone())).unwrap();
        manager.config_mut().active_provider = "deepseek".to_string();
        manager.config_mut().session.ttl_minutes = 5;
        manager.save().unwrap();

        let reloaded = ConfigManager::load(Some(path)).unwrap();
        assert_eq!(reloaded.config().active_provider, "deepseek");
        assert_eq!(reloaded.config().active_model(), "deepseek-chat");
        assert_eq!(reloaded.config().session.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
active_provider = "gemini"

[providers.gemini]
model = "gemini-1.5-pro"

[generation]
temperature = 0.2
"#,
        )
        .unwrap();

        let manager = ConfigManager::load(Some(path)).unwrap();
        let generation = manager.config().generation_config();
        assert_eq!(generation.model, "gemini-1.5-pro");
        assert_eq!(generation.temperature, Some(0.2));
        assert_eq!(generation.max_tokens, Some(2048));
        assert_eq!(manager.config().http.retry_attempts, 2);
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let mut config = Config::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_kind_resolution() {
        assert_eq!(ProviderKind::for_provider("gemini", None), ProviderKind::Gemini);
        assert_eq!(
            ProviderKind::for_provider("deepseek", None),
            ProviderKind::OpenAiCompatible
        );
        let custom = ProviderConfig {
            kind: Some(ProviderKind::Gemini),
            ..Default::default()
        };
        assert_eq!(
            ProviderKind::for_provider("my-proxy", Some(&custom)),
            ProviderKind::Gemini
        );
        assert_eq!(
            ProviderKind::OpenAiCompatible.default_base_url("deepseek"),
            "https://api.deepseek.com/v1"
        );
    }
}
