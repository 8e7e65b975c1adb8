//! In-memory [`RecordIndex`] for tests and embedding into other hosts.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Queries embed the
//! query texts with the index's [`Embedder`] and rank every stored vector
//! by brute-force cosine similarity.

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use super::{IndexEntry, IndexFilter, QueryResult, RecordIndex};
use crate::embedding::{cosine_similarity, Embedder};

struct StoredEntry {
    entry: IndexEntry,
    vector: Vec<f32>,
}

pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<StoredEntry>>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordIndex for InMemoryIndex {
    async fn replace_all(&self, entries: &[IndexEntry], vectors: &[Vec<f32>]) -> Result<()> {
        if entries.len() != vectors.len() {
            bail!(
                "entry/vector count mismatch: {} entries, {} vectors",
                entries.len(),
                vectors.len()
            );
        }
        let mut stored = self
            .entries
            .write()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        stored.clear();
        for (entry, vector) in entries.iter().zip(vectors) {
            stored.push(StoredEntry {
                entry: entry.clone(),
                vector: vector.clone(),
            });
        }
        Ok(())
    }

    async fn query(
        &self,
        query_texts: &[String],
        limit: usize,
        filter: &IndexFilter,
    ) -> Result<QueryResult> {
        let query_vecs = self.embedder.embed_texts(query_texts).await?;
        let stored = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;

        let documents = query_vecs
            .iter()
            .map(|qv| {
                let mut scored: Vec<(f64, &StoredEntry)> = stored
                    .iter()
                    .filter(|s| filter.matches(&s.entry.metadata))
                    .map(|s| (cosine_similarity(qv, &s.vector), s))
                    .collect();
                scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
                scored
                    .into_iter()
                    .take(limit)
                    .map(|(_, s)| s.entry.text.clone())
                    .collect()
            })
            .collect();

        Ok(QueryResult { documents })
    }

    async fn count(&self) -> Result<usize> {
        let stored = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        Ok(stored.len())
    }
}
