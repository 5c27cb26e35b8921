//! Per-language diagnostics and formatting.
//!
//! Every supported language registers one [`LanguageSupport`] in the
//! [`LanguageRegistry`]. Analysis is heuristic and never fails; formatting
//! failures are logged and the input is returned unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod braces;
pub mod classifier;
pub mod external;
pub mod html;
pub mod javascript;
pub mod python;
pub mod sql;

pub use classifier::{language_for_extension, language_for_filename, PLAIN_TEXT};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding on one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error<S: Into<String>>(line: usize, message: S) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning<S: Into<String>>(line: usize, message: S) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Failure inside a formatter; always recovered by the registry
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Formatter {tool} could not be started: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter {tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Formatter {tool} did not finish within {timeout:?}")]
    TimedOut {
        tool: String,
        timeout: std::time::Duration,
    },

    #[error("No formatter succeeded: {0}")]
    Exhausted(String),
}

/// Diagnostic and formatting capability for one language
#[async_trait]
pub trait LanguageSupport: Send + Sync {
    /// Tag this implementation is registered under
    fn language(&self) -> &'static str;

    /// Heuristic diagnostics for the given source
    fn analyze(&self, content: &str) -> Vec<Diagnostic>;

    /// Reformatted source
    async fn format(&self, content: &str) -> Result<String, FormatError>;
}

/// Language tag to capability lookup
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    languages: HashMap<&'static str, Arc<dyn LanguageSupport>>,
}

impl LanguageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in language
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(python::PythonSupport::new());
        registry.register(html::HtmlSupport);
        registry.register(javascript::JavaScriptSupport);
        registry.register(braces::CssSupport);
        registry.register(sql::SqlSupport);
        registry
    }

    /// Add or replace the support for a language
    pub fn register<L: LanguageSupport + 'static>(&mut self, support: L) {
        self.languages.insert(support.language(), Arc::new(support));
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn LanguageSupport>> {
        self.languages.get(language).cloned()
    }

    /// Diagnostics for `content`; unknown languages yield none
    pub fn analyze(&self, content: &str, language: &str) -> Vec<Diagnostic> {
        match self.languages.get(language) {
            Some(support) => support.analyze(content),
            None => Vec::new(),
        }
    }

    /// Formatted `content`; unknown languages and formatter failures return
    /// the input unchanged
    pub async fn format(&self, content: &str, language: &str) -> String {
        let Some(support) = self.languages.get(language) else {
            return content.to_string();
        };

        match support.format(content).await {
            Ok(formatted) => formatted,
            Err(e) => {
                tracing::warn!("Formatting {} failed, returning input unchanged: {}", language, e);
                content.to_string()
            }
        }
    }
}

/// Re-indent lines with four spaces per level.
///
/// `before` returns how many levels to close before emitting the trimmed line
/// and `after` how many to open after it. Blank lines are emitted empty and a
/// trailing newline is preserved.
pub(crate) fn reindent<B, A>(content: &str, mut before: B, mut after: A) -> String
where
    B: FnMut(&str) -> usize,
    A: FnMut(&str) -> usize,
{
    let mut indent = 0usize;
    let mut lines = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.push(String::new());
            continue;
        }
        indent = indent.saturating_sub(before(trimmed));
        lines.push(format!("{}{}", "    ".repeat(indent), trimmed));
        indent += after(trimmed);
    }

    let mut formatted = lines.join("\n");
    if content.ends_with('\n') {
        formatted.push('\n');
    }
    formatted
}
