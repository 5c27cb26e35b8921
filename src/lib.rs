//! codepad - a session-scoped code workspace core
//!
//! Per-session in-memory files and folders, heuristic per-language
//! diagnostics and formatting, and a conversational code assistant over
//! pluggable AI providers with blocking and streaming replies.

pub mod assistant;
pub mod config;
pub mod language;
pub mod llm;
pub mod service;
pub mod session;
pub mod utils;
pub mod workspace;

// Re-export commonly used types and traits
pub use assistant::{Assistant, ChatEvent, ChatEventStream, ChatReply};
pub use config::{Config, ConfigManager, ProviderConfig};
pub use language::{Diagnostic, LanguageRegistry, LanguageSupport, Severity};
pub use llm::{LlmError, LlmProvider, LlmProviderFactory, Message};
pub use service::{Codepad, FileCreated, FileView};
pub use session::{SessionId, SessionStore};
pub use utils::errors::{CodepadError, ConfigError};
pub use workspace::{FileEntry, FileId, FileSummary, Workspace};

/// The main result type used throughout the application
pub type Result<T> = std::result::Result<T, CodepadError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "codepad";
