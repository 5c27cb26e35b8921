//! Text processing utilities

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else if max_length <= 3 {
        "...".to_string()
    } else {
        let head: String = text.chars().take(max_length - 3).collect();
        format!("{}...", head)
    }
}

/// Strip a single leading and trailing markdown code fence, if present.
///
/// The opening fence may carry an info string (e.g. "```python"); only the
/// first and last fence lines are removed.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let mut body = trimmed;

    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(newline) => &body[newline + 1..],
            None => "",
        };
    }

    if let Some(stripped) = body.trim_end().strip_suffix("```") {
        body = stripped;
    }

    body.trim_end_matches(['\n', '\r']).to_string()
}

/// Number of characters on a line, not bytes
pub fn char_len(line: &str) -> usize {
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello world", 20), "hello world");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hi", 2), "hi");
        assert_eq!(truncate("hello", 3), "...");
        assert_eq!(truncate("héllo wörld", 5), "hé...");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fence("```\na = 1\nb = 2\n```\n"), "a = 1\nb = 2");
        assert_eq!(strip_code_fence("no fences here"), "no fences here");
        assert_eq!(strip_code_fence("```js\nlet x = 1;"), "let x = 1;");
    }

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(char_len("ééé"), 3);
    }
}
