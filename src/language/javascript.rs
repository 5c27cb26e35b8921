//! JavaScript semicolon heuristic and brace indentation

use super::braces::format_braces;
use super::{Diagnostic, FormatError, LanguageSupport};
use async_trait::async_trait;

/// Statements that open or continue a block rather than end in `;`
const CONTINUATION_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "function", "class", "try",
    "catch", "finally",
];

const COMMENT_MARKERS: &[&str] = &["//", "/*", "*"];

const STATEMENT_ENDINGS: &[char] = &[';', '{', '}', '(', ')', ','];

pub struct JavaScriptSupport;

fn starts_with_keyword(line: &str) -> bool {
    CONTINUATION_KEYWORDS.iter().any(|keyword| {
        line.strip_prefix(keyword).is_some_and(|rest| {
            !rest
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
    })
}

fn expects_semicolon(line: &str) -> bool {
    if line.is_empty() || line == "{" || line == "}" {
        return false;
    }
    if COMMENT_MARKERS.iter().any(|marker| line.starts_with(marker)) {
        return false;
    }
    if starts_with_keyword(line) {
        return false;
    }
    !line.ends_with(STATEMENT_ENDINGS)
}

#[async_trait]
impl LanguageSupport for JavaScriptSupport {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn analyze(&self, content: &str) -> Vec<Diagnostic> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| expects_semicolon(line.trim()))
            .map(|(index, _)| Diagnostic::warning(index + 1, "missing semicolon"))
            .collect()
    }

    async fn format(&self, content: &str) -> Result<String, FormatError> {
        Ok(format_braces(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged(source: &str) -> Vec<usize> {
        JavaScriptSupport
            .analyze(source)
            .into_iter()
            .map(|d| d.line)
            .collect()
    }

    #[test]
    fn test_missing_semicolon() {
        let source = "let a = 1\nlet b = 2;\nconsole.log(a + b)\n";
        assert_eq!(flagged(source), vec![1]);
    }

    #[test]
    fn test_blocks_and_comments_are_skipped() {
        let source = "function f(a,\n  b) {\n  if (a)\n    return b;\n}\n// note\n/* block\n * more\n */\n";
        assert!(flagged(source).is_empty());
    }

    #[test]
    fn test_keyword_prefix_needs_boundary() {
        assert!(starts_with_keyword("else"));
        assert!(starts_with_keyword("for (;;) {"));
        assert!(!starts_with_keyword("format()"));
        assert!(!starts_with_keyword("iffy = 1"));
        assert_eq!(flagged("format = 1"), vec![1]);
    }

    #[test]
    fn test_known_false_positive_is_kept() {
        // Multi-line expressions are flagged by the heuristic
        let source = "const total = a +\n  b;\n";
        assert_eq!(flagged(source), vec![1]);
    }

    #[tokio::test]
    async fn test_format_uses_braces() {
        let source = "function f() {\nreturn 1;\n}\n";
        assert_eq!(
            JavaScriptSupport.format(source).await.unwrap(),
            "function f() {\n    return 1;\n}\n"
        );
    }
}
