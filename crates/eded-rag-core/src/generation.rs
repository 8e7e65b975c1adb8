//! Grounded generation as a lazy frame stream.
//!
//! [`Generator::generate`] checks the caller's session for context that was
//! retrieved for the same query, then returns a stream of
//! [`GenerationFrame`]s driven by an upstream [`CompletionService`]. The
//! upstream stream is opened on first poll and pulled one chunk per frame,
//! so dropping the frame stream stops consumption immediately.
//!
//! ```text
//! Open ──ok──▶ Stream ──chunk──▶ Content ─┐
//!   │            │  ▲                     │
//!   │            │  └─────────────────────┘
//!   │            ├──end (had content)──▶ consume context ─▶ Done
//!   │            ├──end (no content)───▶ Error ─▶ Done
//!   └──err───────┴──err────────────────▶ Error ─▶ Done
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::Result;
use crate::query::{validate_query, DEFAULT_MAX_QUERY_LEN};
use crate::session::SessionStore;

pub const NO_DATA_MESSAGE: &str = "No data received from completion service.";

/// One unit of streamed generation output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFrame {
    Content(String),
    Error(String),
    Done,
}

impl GenerationFrame {
    /// Server-sent-event rendering of the frame.
    pub fn to_event_data(&self) -> String {
        match self {
            GenerationFrame::Content(text) => format!("data: {}\n\n", json!({ "content": text })),
            GenerationFrame::Error(message) => format!("data: {}\n\n", json!({ "error": message })),
            GenerationFrame::Done => "data: [DONE]\n\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
}

/// An opaque streaming text-generation service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Open a stream of text chunks for `request`.
    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>>;
}

pub fn user_message(context: &str, query: &str) -> String {
    format!("Context: {}\n\nQuery: {}", context, query)
}

pub struct Generator {
    sessions: Arc<SessionStore>,
    completion: Arc<dyn CompletionService>,
    system_prompt: String,
    max_query_len: usize,
}

impl Generator {
    pub fn new(
        sessions: Arc<SessionStore>,
        completion: Arc<dyn CompletionService>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            completion,
            system_prompt: system_prompt.into(),
            max_query_len: DEFAULT_MAX_QUERY_LEN,
        }
    }

    pub fn with_max_query_len(mut self, max_query_len: usize) -> Self {
        self.max_query_len = max_query_len;
        self
    }

    /// Start generation for `raw_query` in `session`.
    ///
    /// Fails with a validation error or `ContextMismatch` before the
    /// completion service is contacted. Every stream returned ends with
    /// [`GenerationFrame::Done`].
    pub fn generate(
        &self,
        session: &str,
        raw_query: &str,
    ) -> Result<BoxStream<'static, GenerationFrame>> {
        let query = validate_query(raw_query, self.max_query_len)?;
        let context = self.sessions.context_for(session, &query.canonical)?;

        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            user_message: user_message(&context.context, &query.canonical),
        };
        debug!(session, passages = context.passages.len(), "starting generation");

        let run = Run {
            sessions: Arc::clone(&self.sessions),
            session: session.to_string(),
            query: query.canonical,
        };
        let start = Step::Open {
            completion: Arc::clone(&self.completion),
            request,
        };

        Ok(stream::unfold((run, start), |(run, step)| next_frame(run, step)).boxed())
    }
}

struct Run {
    sessions: Arc<SessionStore>,
    session: String,
    query: String,
}

enum Step {
    Open {
        completion: Arc<dyn CompletionService>,
        request: CompletionRequest,
    },
    Stream {
        upstream: BoxStream<'static, anyhow::Result<String>>,
        received: bool,
    },
    Done,
    Finished,
}

async fn next_frame(run: Run, step: Step) -> Option<(GenerationFrame, (Run, Step))> {
    let mut step = step;
    loop {
        match step {
            Step::Open {
                completion,
                request,
            } => match completion.stream_completion(&request).await {
                Ok(upstream) => {
                    step = Step::Stream {
                        upstream,
                        received: false,
                    }
                }
                Err(e) => {
                    warn!(session = %run.session, "completion stream failed to open: {:#}", e);
                    return Some((GenerationFrame::Error(format!("{:#}", e)), (run, Step::Done)));
                }
            },
            Step::Stream {
                mut upstream,
                received,
            } => match upstream.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => {
                    step = Step::Stream { upstream, received }
                }
                Some(Ok(chunk)) => {
                    return Some((
                        GenerationFrame::Content(chunk),
                        (
                            run,
                            Step::Stream {
                                upstream,
                                received: true,
                            },
                        ),
                    ))
                }
                Some(Err(e)) => {
                    warn!(session = %run.session, "completion stream failed: {:#}", e);
                    return Some((GenerationFrame::Error(format!("{:#}", e)), (run, Step::Done)));
                }
                None if received => {
                    run.sessions.consume(&run.session, &run.query);
                    return Some((GenerationFrame::Done, (run, Step::Finished)));
                }
                None => {
                    return Some((
                        GenerationFrame::Error(NO_DATA_MESSAGE.to_string()),
                        (run, Step::Done),
                    ))
                }
            },
            Step::Done => return Some((GenerationFrame::Done, (run, Step::Finished))),
            Step::Finished => return None,
        }
    }
}
