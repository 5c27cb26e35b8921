//! Python diagnostics and formatting

use super::external::{CommandFormatter, ExternalFormatter};
use super::{Diagnostic, FormatError, LanguageSupport};
use async_trait::async_trait;
use crate::utils::text::char_len;
use tree_sitter::{Language, Node, Parser};

/// Longest line accepted without a warning
pub const MAX_LINE_LENGTH: usize = 79;

pub struct PythonSupport {
    language: Language,
    formatters: Vec<Box<dyn ExternalFormatter>>,
}

impl Default for PythonSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonSupport {
    /// Formats with `black`, falling back to `autopep8`
    pub fn new() -> Self {
        Self::with_formatters(vec![
            Box::new(CommandFormatter::new("black", &["-q", "-"])),
            Box::new(CommandFormatter::new("autopep8", &["-"])),
        ])
    }

    /// Use the given formatters, tried in order
    pub fn with_formatters(formatters: Vec<Box<dyn ExternalFormatter>>) -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
            formatters,
        }
    }

    /// Line of the first syntax error, or `None` when the source parses
    fn syntax_error_line(&self, content: &str) -> Option<usize> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language) {
            tracing::warn!("Python grammar unavailable: {}", e);
            return None;
        }
        let Some(tree) = parser.parse(content, None) else {
            return Some(1);
        };

        let root = tree.root_node();
        if !root.has_error() {
            return None;
        }
        Some(first_error(root).map_or(1, |node| node.start_position().row + 1))
    }
}

/// First error or missing node in document order
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Any two consecutive spaces on a code line, indentation included
fn has_double_space(line: &str) -> bool {
    let body = line.trim_start();
    !body.is_empty() && !body.starts_with('#') && line.contains("  ")
}

#[async_trait]
impl LanguageSupport for PythonSupport {
    fn language(&self) -> &'static str {
        "python"
    }

    fn analyze(&self, content: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(line) = self.syntax_error_line(content) {
            diagnostics.push(Diagnostic::error(line, "invalid syntax"));
        }

        for (index, line) in content.lines().enumerate() {
            let length = char_len(line);
            if length > MAX_LINE_LENGTH {
                diagnostics.push(Diagnostic::warning(
                    index + 1,
                    format!("line too long ({} > {} characters)", length, MAX_LINE_LENGTH),
                ));
            }
            if has_double_space(line) {
                diagnostics.push(Diagnostic::warning(index + 1, "multiple spaces detected"));
            }
        }

        diagnostics
    }

    async fn format(&self, content: &str) -> Result<String, FormatError> {
        let mut failures = Vec::new();
        for formatter in &self.formatters {
            match formatter.format(content).await {
                Ok(formatted) => return Ok(formatted),
                Err(e) => {
                    tracing::debug!("{} did not format python input: {}", formatter.name(), e);
                    failures.push(e.to_string());
                }
            }
        }
        Err(FormatError::Exhausted(failures.join("; ")))
    }
}
