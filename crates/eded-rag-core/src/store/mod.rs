//! Record index abstraction.
//!
//! The [`RecordIndex`] trait is the retrieval pipeline's view of storage:
//! an opaque key → (text, embedding, metadata) map that can be queried by
//! text with an optional exact-match `code` filter. Backends embed the
//! query texts themselves, so callers only deal in strings.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::IngestRecord;

/// Metadata columns stored next to each indexed record.
///
/// `note`, `usage`, and `usage_description` are `None` when the record has
/// none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub code: String,
    pub name: String,
    pub description: String,
    pub representation: String,
    pub representation_description: String,
    pub note: Option<String>,
    pub usage: Option<String>,
    pub usage_description: Option<String>,
}

/// One record as written to an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Index key (the record id).
    pub id: String,
    /// Passage text that is embedded and returned by queries.
    pub text: String,
    pub metadata: RecordMetadata,
}

impl From<&IngestRecord> for IndexEntry {
    fn from(row: &IngestRecord) -> Self {
        Self {
            id: row.id.clone(),
            text: row.text.clone(),
            metadata: RecordMetadata {
                code: row.id.clone(),
                name: row.name.clone(),
                description: row.description.clone(),
                representation: row.representation.clone(),
                representation_description: row.representation_description.clone(),
                note: row.note.clone(),
                usage: row.usage.clone(),
                usage_description: row.usage_description.clone(),
            },
        }
    }
}

/// Restricts a query to records whose metadata matches exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexFilter {
    pub code: Option<String>,
}

impl IndexFilter {
    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
        }
    }

    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        match &self.code {
            Some(code) => metadata.code == *code,
            None => true,
        }
    }
}

/// Query output grouped per query text, nearest first within each group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub documents: Vec<Vec<String>>,
}

impl QueryResult {
    /// All documents in group order, then rank order.
    pub fn flatten(self) -> Vec<String> {
        self.documents.into_iter().flatten().collect()
    }
}

/// Abstract record index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`replace_all`](RecordIndex::replace_all) | Replace the whole index contents |
/// | [`query`](RecordIndex::query) | Nearest records per query text |
/// | [`count`](RecordIndex::count) | Number of indexed records |
#[async_trait]
pub trait RecordIndex: Send + Sync {
    /// Replace every stored record with `entries`, one vector per entry.
    async fn replace_all(&self, entries: &[IndexEntry], vectors: &[Vec<f32>]) -> Result<()>;

    /// Return up to `limit` passages per query text, nearest first.
    async fn query(
        &self,
        query_texts: &[String],
        limit: usize,
        filter: &IndexFilter,
    ) -> Result<QueryResult>;

    async fn count(&self) -> Result<usize>;
}
