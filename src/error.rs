//! Error types for the sync and retrieval pipeline.
//!
//! The taxonomy matters to callers: validation errors are rejected before any
//! I/O, transport errors are fatal to the current call, and data-quality
//! issues (malformed embeddings, missing optional fields) never surface here
//! at all — they degrade to defined fallback values inside the projector.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Query vector does not match the index's dense-vector dimensionality.
    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Neither query text nor a query vector was supplied.
    #[error("search requires query text, a query vector, or both")]
    EmptyQuery,

    /// A fetched row has no usable id; the id is the upsert key and cannot
    /// be substituted.
    #[error("row {position} for group key '{group_key}' is missing its id")]
    MissingId { group_key: String, position: usize },

    /// Caller-supplied table name failed the identifier check.
    #[error("invalid table name: '{0}'")]
    InvalidTableName(String),

    /// Index creation was attempted and refused by the engine.
    #[error("failed to create index '{index}': {reason}")]
    IndexCreate { index: String, reason: String },

    /// The engine answered with something we could not interpret.
    #[error("unexpected search engine response: {0}")]
    Response(String),

    /// Search engine unreachable or the HTTP exchange itself failed.
    #[error("search engine transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Relational store error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
