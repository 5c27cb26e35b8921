//! Error types used throughout the application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for codepad
#[derive(Error, Debug)]
pub enum CodepadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM provider error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("File system error: {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration: {source}")]
    ReadError {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write configuration: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {source}")]
    SerializeError {
        #[source]
        source: toml::ser::Error,
    },
}

impl CodepadError {
    /// Create a new session not found error
    pub fn session_not_found<S: Into<String>>(session_id: S) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S1: Into<String>, S2: Into<String>>(field: S1, message: S2) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Create a new unknown error
    pub fn unknown<S: Into<String>>(message: S) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Whether the error came from the AI backend
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Llm(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Llm(_) => "llm",
            Self::SessionNotFound { .. } => "session",
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "notfound",
            Self::FileSystem { .. } => "filesystem",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
            Self::Unknown { .. } => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_categories() {
        assert_eq!(CodepadError::session_not_found("abc").category(), "session");
        assert_eq!(CodepadError::not_found("file x").category(), "notfound");
        assert_eq!(
            CodepadError::from(LlmError::MissingCredential {
                provider: "openrouter".to_string()
            })
            .category(),
            "llm"
        );
    }

    #[test]
    fn test_display_messages() {
        let err = CodepadError::validation("filename", "must not be empty");
        assert_eq!(err.to_string(), "Validation error: filename: must not be empty");
        assert!(!err.is_upstream());
    }
}
