//! Query validation and code-filter detection.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{EdedError, Result};

static CODE_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)code\s+(\d{4})\b").unwrap());

pub const DEFAULT_MAX_QUERY_LEN: usize = 1000;

/// A query that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    /// Trimmed input, used for keywords, filters, and embedding.
    pub raw: String,
    /// HTML-escaped form, used to key session context.
    pub canonical: String,
}

/// Trim, bound, and escape a user query.
///
/// Rejects empty input, input longer than `max_len` characters, and any
/// non-ASCII character.
pub fn validate_query(input: &str, max_len: usize) -> Result<ValidatedQuery> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(EdedError::Validate("Query is required".to_string()));
    }
    if raw.chars().count() > max_len {
        return Err(EdedError::Validate("Input too long.".to_string()));
    }
    if !raw.is_ascii() {
        return Err(EdedError::Validate(
            "Invalid characters detected.".to_string(),
        ));
    }
    Ok(ValidatedQuery {
        raw: raw.to_string(),
        canonical: escape_html(raw),
    })
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// The four-digit code named by a `code NNNN` phrase, if any.
pub fn extract_code_filter(query: &str) -> Option<String> {
    CODE_FILTER
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
