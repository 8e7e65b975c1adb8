//! # eded-rag core
//!
//! Pure logic for eded-rag: the section record parser, representation
//! decoder, usage table, text highlighter, similarity scoring, and the
//! retrieve/generate orchestration over pluggable collaborators.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem I/O.
//! Embedding, indexing, and completion are reached through the
//! [`embedding::Embedder`], [`store::RecordIndex`], and
//! [`generation::CompletionService`] traits, implemented by the `eded-rag`
//! app crate (or by the in-memory test doubles in this crate).
//!
//! ## Flow
//!
//! ```text
//! document text ──▶ parser ──▶ Record ──▶ (app) embed + index
//!
//! query ──▶ validate_query ──▶ RecordIndex::query ──▶ Embedder
//!                                      │
//!                                      ▼
//!                     similarity::score_candidates + highlight
//!                                      │
//!                                      ▼
//!                  RetrievalResponse + SessionStore::record
//!                                      │
//!                                      ▼
//!                 Generator::generate ──▶ GenerationFrame stream
//! ```

pub mod embedding;
pub mod error;
pub mod generation;
pub mod highlight;
pub mod models;
pub mod parser;
pub mod query;
pub mod representation;
pub mod retrieval;
pub mod session;
pub mod similarity;
pub mod store;
pub mod usage;

pub use error::{EdedError, Phase, Result};
