//! Input checks for words submitted for analysis.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::Error;

/// Letters (Latin-1 and Latin Extended-A), whitespace and hyphens, at most 50 characters
static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-ZÀ-ſ\s-]{1,50}$").expect("Failed to compile word pattern"));

/// Escape the characters that are significant in HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Validate and normalize a submitted word.
///
/// Returns the trimmed word. Anything containing markup, digits or punctuation other than
/// hyphens is rejected.
pub fn validate_word(raw: Option<&str>) -> Result<String, Error> {
    let word = raw.map(str::trim).unwrap_or_default();
    if word.is_empty() {
        return Err(Error::BadRequest {
            message: "Word parameter required".to_string(),
        });
    }

    let escaped = escape_html(word);
    if !WORD_PATTERN.is_match(&escaped) {
        return Err(Error::BadRequest {
            message: "Invalid word format".to_string(),
        });
    }

    Ok(escaped)
}
