//! Core data models.
//!
//! [`Record`]s are produced once by the parser and never mutated. The
//! retrieval types ([`SimilarityResult`], [`RetrievalResponse`],
//! [`RetrievedContext`]) live for a single request.

use serde::{Deserialize, Serialize};

use crate::representation::TypeTag;
use crate::usage::UsageCode;

/// One parsed section of the element directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Numeric identifier, unique within a document.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Raw specifier as written in the source, e.g. `an..35`.
    pub representation: String,
    /// Decoded phrase, e.g. `Up to 35 alphanumeric characters`.
    /// Empty when the section has no `Repr:` line.
    pub representation_description: String,
    pub representation_type: TypeTag,
    pub representation_max_length: Option<u32>,
    /// `None` when the section has no `Note:` marker; `Some("")` when the
    /// marker is present with nothing after it.
    pub note: Option<String>,
    pub usage_code: Option<UsageCode>,
}

impl Record {
    pub fn usage_description(&self) -> Option<&'static str> {
        self.usage_code.map(|u| u.description())
    }

    /// The multi-line rendering that gets embedded and indexed.
    pub fn text(&self) -> String {
        let mut text = format!(
            "[Code:] {}\n[Name:] {}\n[Description:] {}\n[Representation:] {}",
            self.id, self.name, self.description, self.representation
        );
        if let Some(note) = &self.note {
            text.push_str("\n[Note:] ");
            text.push_str(note);
        }
        text
    }

    pub fn to_ingest(&self) -> IngestRecord {
        IngestRecord {
            id: self.id.clone(),
            text: self.text(),
            name: self.name.clone(),
            description: self.description.clone(),
            representation: self.representation.clone(),
            representation_description: self.representation_description.clone(),
            note: self.note.clone(),
            usage: self.usage_code.map(|u| u.token().to_string()),
            usage_description: self.usage_description().map(str::to_string),
        }
    }
}

/// Output of the section parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Text before the first section delimiter.
    pub introduction: String,
    pub records: Vec<Record>,
}

/// One row of the ingestion artifact (JSON), in artifact key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRecord {
    pub id: String,
    pub text: String,
    pub name: String,
    pub description: String,
    pub representation: String,
    pub representation_description: String,
    pub note: Option<String>,
    pub usage: Option<String>,
    pub usage_description: Option<String>,
}

/// Score and highlighted rendering of one retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    #[serde(skip)]
    pub passage_text: String,
    #[serde(rename = "context")]
    pub highlighted_text: String,
    #[serde(rename = "similarity")]
    pub similarity_score: f64,
}

/// Scored passages in source order plus the top-K aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResponse {
    #[serde(rename = "similarities")]
    pub results: Vec<SimilarityResult>,
    /// Absent iff there were no candidates.
    #[serde(rename = "top_k_similarity")]
    pub top_k_aggregate_similarity: Option<f64>,
}

impl RetrievalResponse {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            top_k_aggregate_similarity: None,
        }
    }
}

/// Retrieved evidence handed from a retrieve call to a later generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedContext {
    /// Canonical (validated, escaped) query the context was retrieved for.
    pub query: String,
    /// Passages joined with single spaces.
    pub context: String,
    pub passages: Vec<String>,
}

impl RetrievedContext {
    pub fn new(query: impl Into<String>, passages: Vec<String>) -> Self {
        Self {
            query: query.into(),
            context: passages.join(" "),
            passages,
        }
    }
}
