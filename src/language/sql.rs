//! SQL statement checks and pretty-printing

use super::{Diagnostic, FormatError, LanguageSupport};
use async_trait::async_trait;
use regex::Regex;
use sqlformat::{FormatOptions, Indent, QueryParams};

lazy_static::lazy_static! {
    static ref STATEMENT: Regex =
        Regex::new(r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|CREATE|DROP|ALTER)\b").unwrap();
    static ref SELECT: Regex = Regex::new(r"(?i)\bSELECT\b").unwrap();
    static ref FROM: Regex = Regex::new(r"(?i)\bFROM\b").unwrap();
}

pub struct SqlSupport;

fn strip_comment(line: &str) -> &str {
    line.split_once("--").map_or(line, |(code, _)| code)
}

#[async_trait]
impl LanguageSupport for SqlSupport {
    fn language(&self) -> &'static str {
        "sql"
    }

    fn analyze(&self, content: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let code = strip_comment(line);
            if !STATEMENT.is_match(code) {
                continue;
            }
            if SELECT.is_match(code) && !FROM.is_match(code) {
                diagnostics.push(Diagnostic::error(index + 1, "SELECT missing FROM clause"));
            }
        }

        diagnostics
    }

    async fn format(&self, content: &str) -> Result<String, FormatError> {
        let options = FormatOptions {
            indent: Indent::Spaces(4),
            uppercase: Some(true),
            lines_between_queries: 1,
            ..FormatOptions::default()
        };
        Ok(sqlformat::format(content, &QueryParams::None, &options))
    }
}
