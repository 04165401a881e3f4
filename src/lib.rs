//! # docsync
//!
//! Synchronizes parsed PDF pages from a Postgres table into an
//! Elasticsearch index and runs hybrid (keyword + vector) retrieval
//! against it.
//!
//! Pages arrive in Postgres upstream (a parser writes one row per page,
//! with content-derived hash keys and a stored embedding). docsync pulls
//! all rows sharing a `hashed_filepath` group key, projects them into the
//! index document schema, and bulk-upserts them keyed by document id, so
//! re-running a sync overwrites rather than duplicates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌───────────────┐
//! │ Postgres │──▶│ project + validate │──▶│ Elasticsearch │
//! │ page rows│   │  (rows → documents)│   │  _bulk upsert │
//! └──────────┘   └───────────────────┘   └──────┬────────┘
//!                                               │
//!                              ┌────────────────┤
//!                              ▼                ▼
//!                        ┌──────────┐    ┌────────────┐
//!                        │ group    │    │ hybrid     │
//!                        │ fetch    │    │ search     │
//!                        └──────────┘    └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`db`] | Postgres connection |
//! | [`rows`] | Row source trait + Postgres implementation |
//! | [`project`] | Row-to-document projection and embedding parsing |
//! | [`elastic`] | Elasticsearch HTTP client |
//! | [`index`] | Index lifecycle (ensure, list, delete) |
//! | [`sync`] | Bulk synchronization with partial-failure accounting |
//! | [`query`] | Hybrid query composition |
//! | [`search`] | Retrieval (group fetch, scored search) |
//! | [`embedding`] | Query embedding via Ollama |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod db;
pub mod elastic;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod project;
pub mod query;
pub mod rows;
pub mod search;
pub mod sync;
