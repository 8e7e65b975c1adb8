//! Session-scoped retrieved context.
//!
//! A retrieve call records the evidence it found under the caller's session
//! key; a later generate call for the same query reads it back. Sessions
//! never see each other's context.

use dashmap::DashMap;
use tracing::debug;

use crate::error::{EdedError, Result};
use crate::models::RetrievedContext;

#[derive(Debug, Default)]
pub struct SessionStore {
    entries: DashMap<String, RetrievedContext>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `context` for `session`, replacing any previous entry.
    pub fn record(&self, session: &str, context: RetrievedContext) {
        debug!(session, passages = context.passages.len(), "recording context");
        self.entries.insert(session.to_string(), context);
    }

    /// The context recorded for `session`, provided it was retrieved for
    /// `query`. A mismatch leaves the store untouched.
    pub fn context_for(&self, session: &str, query: &str) -> Result<RetrievedContext> {
        match self.entries.get(session) {
            Some(entry) if entry.query == query => Ok(entry.clone()),
            _ => Err(EdedError::ContextMismatch),
        }
    }

    /// Drop the entry for `session` if it still belongs to `query`.
    ///
    /// Returns `false` when the entry is gone or was overwritten by a newer
    /// retrieval.
    pub fn consume(&self, session: &str, query: &str) -> bool {
        self.entries
            .remove_if(session, |_, ctx| ctx.query == query)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
