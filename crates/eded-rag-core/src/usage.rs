//! Fixed usage-code table.
//!
//! A name line may end with one of three bracketed tokens telling whether
//! the element applies to batch messages, interactive messages, or both.

use serde::{Serialize, Serializer};

use crate::error::{EdedError, Result};

/// One of the three usage tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCode {
    Batch,
    Interactive,
    Common,
}

const USAGE_TABLE: [(UsageCode, &str, &str); 3] = [
    (UsageCode::Batch, "[B]", "used in batch messages only"),
    (UsageCode::Interactive, "[I]", "used in interactive messages only"),
    (
        UsageCode::Common,
        "[C]",
        "common usage in both batch and interactive messages",
    ),
];

impl UsageCode {
    /// Look up a bracketed token such as `[B]`.
    ///
    /// Any token outside the table is a [`EdedError::Lookup`] failure.
    pub fn lookup(token: &str) -> Result<Self> {
        USAGE_TABLE
            .iter()
            .find(|(_, t, _)| *t == token)
            .map(|(code, _, _)| *code)
            .ok_or_else(|| EdedError::Lookup(token.to_string()))
    }

    pub fn token(&self) -> &'static str {
        self.entry().1
    }

    pub fn description(&self) -> &'static str {
        self.entry().2
    }

    fn entry(&self) -> &'static (UsageCode, &'static str, &'static str) {
        match self {
            UsageCode::Batch => &USAGE_TABLE[0],
            UsageCode::Interactive => &USAGE_TABLE[1],
            UsageCode::Common => &USAGE_TABLE[2],
        }
    }
}

impl Serialize for UsageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}
