//! Retrieval orchestration.
//!
//! [`Retriever::retrieve`] runs one query end to end:
//!
//! 1. Validate the query (nothing touches the index on rejection).
//! 2. Detect a `code NNNN` phrase and turn it into an exact-match filter.
//! 3. Query the index with the limit for the requested purpose.
//! 4. Flatten the grouped result into one ordered passage list.
//! 5. Embed the query and every passage in a single call.
//! 6. Score, pick the top-K aggregate, and highlight each passage.
//! 7. Record the passages under the caller's session for a later
//!    generate call.
//!
//! An empty candidate set short-circuits after step 4 and records nothing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::error::{EdedError, Result};
use crate::highlight::{highlight, query_keywords, StopWords};
use crate::models::{RetrievalResponse, RetrievedContext, SimilarityResult};
use crate::query::{extract_code_filter, validate_query, DEFAULT_MAX_QUERY_LEN};
use crate::session::SessionStore;
use crate::similarity::score_candidates;
use crate::store::{IndexFilter, RecordIndex};

/// Which caller a retrieval serves; selects the candidate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPurpose {
    /// Evidence for a generated answer.
    Answer,
    /// Highlighted passages shown to the user.
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalLimits {
    pub answer: usize,
    pub preview: usize,
    pub max_query_len: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            answer: 2,
            preview: 10,
            max_query_len: DEFAULT_MAX_QUERY_LEN,
        }
    }
}

impl RetrievalLimits {
    pub fn for_purpose(&self, purpose: RetrievalPurpose) -> usize {
        match purpose {
            RetrievalPurpose::Answer => self.answer,
            RetrievalPurpose::Preview => self.preview,
        }
    }
}

pub struct Retriever {
    index: Arc<dyn RecordIndex>,
    embedder: Arc<dyn Embedder>,
    sessions: Arc<SessionStore>,
    stop_words: StopWords,
    limits: RetrievalLimits,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn RecordIndex>,
        embedder: Arc<dyn Embedder>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            index,
            embedder,
            sessions,
            stop_words: StopWords::english(),
            limits: RetrievalLimits::default(),
        }
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    pub fn with_limits(mut self, limits: RetrievalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn retrieve(
        &self,
        session: &str,
        raw_query: &str,
        purpose: RetrievalPurpose,
    ) -> Result<RetrievalResponse> {
        let query = validate_query(raw_query, self.limits.max_query_len)?;

        let filter = match extract_code_filter(&query.raw) {
            Some(code) => {
                debug!(code = %code, "restricting retrieval to code");
                IndexFilter::by_code(code)
            }
            None => IndexFilter::default(),
        };
        let limit = self.limits.for_purpose(purpose);

        let passages = self
            .index
            .query(&[query.raw.clone()], limit, &filter)
            .await
            .map_err(|e| EdedError::retrieve("record index query failed", e))?
            .flatten();

        if passages.is_empty() {
            info!(session, "no passages retrieved");
            return Ok(RetrievalResponse::empty());
        }

        let mut texts = Vec::with_capacity(passages.len() + 1);
        texts.push(query.raw.clone());
        texts.extend(passages.iter().cloned());
        let mut vectors = self
            .embedder
            .embed_texts(&texts)
            .await
            .map_err(|e| EdedError::retrieve("embedding failed", e))?;
        if vectors.len() != texts.len() {
            return Err(EdedError::Retrieve(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        let candidates = vectors.split_off(1);
        let query_vec = &vectors[0];

        let scored = score_candidates(query_vec, &candidates)?;
        let keywords = query_keywords(&query.raw, &self.stop_words);

        let results = passages
            .iter()
            .zip(&scored.scores)
            .map(|(passage, &score)| SimilarityResult {
                passage_text: passage.clone(),
                highlighted_text: highlight(passage, &keywords),
                similarity_score: score,
            })
            .collect();
        let top_k = scored.top_k.map(|t| t.similarity);

        info!(
            session,
            passages = passages.len(),
            top_k = ?top_k,
            "retrieved context"
        );
        self.sessions
            .record(session, RetrievedContext::new(query.canonical, passages));

        Ok(RetrievalResponse {
            results,
            top_k_aggregate_similarity: top_k,
        })
    }
}
