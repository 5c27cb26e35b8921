//! Brace-depth indentation shared by curly-brace languages

use super::{reindent, Diagnostic, FormatError, LanguageSupport};
use async_trait::async_trait;

/// Indent by brace depth: close a level before a line ending in `}` and open
/// one after a line ending in `{`
pub fn format_braces(content: &str) -> String {
    reindent(
        content,
        |line| line.ends_with('}') as usize,
        |line| line.ends_with('{') as usize,
    )
}

/// Stylesheets get brace indentation and no diagnostics
pub struct CssSupport;

#[async_trait]
impl LanguageSupport for CssSupport {
    fn language(&self) -> &'static str {
        "css"
    }

    fn analyze(&self, _content: &str) -> Vec<Diagnostic> {
        Vec::new()
    }

    async fn format(&self, content: &str) -> Result<String, FormatError> {
        Ok(format_braces(content))
    }
}
