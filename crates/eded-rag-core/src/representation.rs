//! Representation specifier decoder.
//!
//! Turns compact specifiers such as `an..35`, `n3`, or `a1` into a
//! human-readable phrase plus a type tag and numeric bound.
//!
//! | Specifier | Phrase |
//! |-----------|--------|
//! | `an..35` | `Up to 35 alphanumeric characters` |
//! | `n3` | `3 numeric characters` |
//! | `a1` | `1 alphabetic character` |
//! | *(empty)* | `characters` |
//!
//! Decoding never fails: a specifier that matches neither the digit nor
//! the type pattern degrades to the bare unit word.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static BOUND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());
static TYPE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[an]+").unwrap());

/// Character class allowed by a representation specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Alphabetic,
    Numeric,
    Alphanumeric,
    Unknown,
}

impl TypeTag {
    fn from_code(code: &str) -> Self {
        match code {
            "a" => TypeTag::Alphabetic,
            "n" => TypeTag::Numeric,
            "an" => TypeTag::Alphanumeric,
            _ => TypeTag::Unknown,
        }
    }

    /// The word used in the decoded phrase, or `None` for [`TypeTag::Unknown`].
    pub fn word(&self) -> Option<&'static str> {
        match self {
            TypeTag::Alphabetic => Some("alphabetic"),
            TypeTag::Numeric => Some("numeric"),
            TypeTag::Alphanumeric => Some("alphanumeric"),
            TypeTag::Unknown => None,
        }
    }
}

/// Decoded view of a representation specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentationSpec {
    pub phrase: String,
    pub type_tag: TypeTag,
    pub max_length: Option<u32>,
}

/// Decode a representation specifier.
///
/// Parts are emitted in fixed order `[Up to] [bound] [type] unit`, each
/// only when its source pattern matched. The unit word is singular only
/// when the bound is written exactly as `1`.
///
/// ```rust
/// use eded_rag_core::representation::{decode, TypeTag};
///
/// let spec = decode("an..35");
/// assert_eq!(spec.phrase, "Up to 35 alphanumeric characters");
/// assert_eq!(spec.type_tag, TypeTag::Alphanumeric);
/// assert_eq!(spec.max_length, Some(35));
/// ```
pub fn decode(specifier: &str) -> RepresentationSpec {
    let specifier = specifier.trim();
    let mut phrase = String::new();
    let mut unit = "characters";
    let mut max_length = None;

    if specifier.contains("..") {
        phrase.push_str("Up to ");
    }

    if let Some(bound) = BOUND.find(specifier) {
        let digits = bound.as_str();
        phrase.push_str(digits);
        phrase.push(' ');
        if digits == "1" {
            unit = "character";
        }
        // Oversized bounds keep their digits in the phrase only.
        max_length = digits.parse::<u32>().ok();
    }

    let type_tag = TYPE_RUN
        .find(specifier)
        .map(|m| TypeTag::from_code(m.as_str()))
        .unwrap_or(TypeTag::Unknown);

    if let Some(word) = type_tag.word() {
        phrase.push_str(word);
        phrase.push(' ');
    }

    phrase.push_str(unit);

    RepresentationSpec {
        phrase,
        type_tag,
        max_length,
    }
}
