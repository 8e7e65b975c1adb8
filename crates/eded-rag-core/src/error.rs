//! Error taxonomy for parsing, retrieval, and generation.
//!
//! Every variant belongs to exactly one [`Phase`], so callers can report
//! which step failed and decide between a client-facing rejection and a
//! server-side failure without inspecting message text.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EdedError>;

/// The pipeline step an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Lookup,
    Validate,
    Retrieve,
    Generate,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Parse => "parse",
            Phase::Lookup => "lookup",
            Phase::Validate => "validate",
            Phase::Retrieve => "retrieve",
            Phase::Generate => "generate",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum EdedError {
    /// A section had content but no extractable numeric id.
    #[error("Malformed section {section}: {message}")]
    Parse { section: usize, message: String },

    /// A usage token outside the fixed table.
    #[error("Unknown usage code: {0}")]
    Lookup(String),

    #[error("{0}")]
    Validate(String),

    /// Generation requested without a matching prior retrieval.
    #[error("Please get context first")]
    ContextMismatch,

    #[error("Retrieval error: {0}")]
    Retrieve(String),
}

impl EdedError {
    pub fn phase(&self) -> Phase {
        match self {
            EdedError::Parse { .. } => Phase::Parse,
            EdedError::Lookup(_) => Phase::Lookup,
            EdedError::Validate(_) => Phase::Validate,
            EdedError::ContextMismatch => Phase::Generate,
            EdedError::Retrieve(_) => Phase::Retrieve,
        }
    }

    /// True for errors caused by the caller's input or request ordering.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EdedError::Validate(_) | EdedError::ContextMismatch)
    }

    /// Wrap a collaborator failure (index, embedder) as a retrieval error,
    /// keeping the full `anyhow` context chain in the message.
    pub fn retrieve(context: &str, err: anyhow::Error) -> Self {
        EdedError::Retrieve(format!("{}: {:#}", context, err))
    }
}
