//! Text normalization, stop-word filtering, and keyword highlighting.
//!
//! A single token pattern, `\b[\w.-]+\b`, is used both to build the keyword
//! set from a query and to find spans to mark in a passage, so a keyword
//! like `an..35` or `UN-EDIFACT` matches as one unit on both sides.

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[\w.-]+\b").unwrap());

pub const HIGHLIGHT_OPEN: &str = "<span style='background-color: #ffefbf'>";
pub const HIGHLIGHT_CLOSE: &str = "</span>";

/// English stop words (the NLTK English list).
const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Lowercase `text` and return its tokens in order.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A set of lowercase words that are never highlighted.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn english() -> Self {
        Self {
            words: ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Add extra words (lowercased) to the set.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(extra.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

/// Build the highlight keyword set for a query: its normalized tokens
/// minus stop words.
pub fn query_keywords(query: &str, stop_words: &StopWords) -> HashSet<String> {
    normalize(query)
        .into_iter()
        .filter(|t| !stop_words.contains(t))
        .collect()
}

/// Wrap every token of `passage` whose lowercase form is in `keywords`.
///
/// Non-matching tokens keep their original casing, and every character
/// outside a token (whitespace, punctuation) is copied unchanged.
pub fn highlight(passage: &str, keywords: &HashSet<String>) -> String {
    if keywords.is_empty() {
        return passage.to_string();
    }
    TOKEN
        .replace_all(passage, |caps: &Captures| {
            let word = &caps[0];
            if keywords.contains(&word.to_lowercase()) {
                format!("{}{}{}", HIGHLIGHT_OPEN, word, HIGHLIGHT_CLOSE)
            } else {
                word.to_string()
            }
        })
        .into_owned()
}
