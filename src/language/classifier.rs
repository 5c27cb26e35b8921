//! File extension to language tag mapping

use std::collections::HashMap;

/// Tag for anything the classifier does not recognise
pub const PLAIN_TEXT: &str = "text";

lazy_static::lazy_static! {
    static ref EXTENSION_LANGUAGES: HashMap<&'static str, &'static str> = {
        let table: &[(&[&str], &str)] = &[
            (&["py"], "python"),
            (&["html", "htm"], "html"),
            (&["css"], "css"),
            (&["js", "mjs", "cjs"], "javascript"),
            (&["ts"], "typescript"),
            (&["sql"], "sql"),
            (&["json"], "json"),
            (&["xml"], "xml"),
            (&["md"], "markdown"),
            (&["txt"], PLAIN_TEXT),
            (&["cpp", "cc", "hpp"], "cpp"),
            (&["c", "h"], "c"),
            (&["java"], "java"),
            (&["php"], "php"),
            (&["rb"], "ruby"),
            (&["go"], "go"),
            (&["rs"], "rust"),
            (&["sh"], "shell"),
            (&["yml", "yaml"], "yaml"),
            (&["toml"], "toml"),
        ];
        table
            .iter()
            .flat_map(|(extensions, language)| extensions.iter().map(move |ext| (*ext, *language)))
            .collect()
    };
}

/// Language tag for a file extension, case-insensitive
pub fn language_for_extension(extension: &str) -> &'static str {
    EXTENSION_LANGUAGES
        .get(extension.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(PLAIN_TEXT)
}

/// Language tag for a file name, using its last extension
pub fn language_for_filename(name: &str) -> &'static str {
    language_for_extension(&crate::workspace::extension_of(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(language_for_extension("py"), "python");
        assert_eq!(language_for_extension("htm"), "html");
        assert_eq!(language_for_extension("mjs"), "javascript");
        assert_eq!(language_for_extension("hpp"), "cpp");
        assert_eq!(language_for_extension("yml"), "yaml");
        assert_eq!(language_for_extension("rs"), "rust");
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(language_for_extension("PY"), "python");
        assert_eq!(language_for_extension("Sql"), "sql");
    }

    #[test]
    fn test_unknown_is_text() {
        assert_eq!(language_for_extension("xyz"), PLAIN_TEXT);
        assert_eq!(language_for_extension(""), PLAIN_TEXT);
    }

    #[test]
    fn test_filename() {
        assert_eq!(language_for_filename("index.HTML"), "html");
        assert_eq!(language_for_filename("README"), PLAIN_TEXT);
    }
}
