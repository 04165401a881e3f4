//! Core data models used throughout docsync.
//!
//! These types represent the page rows fetched from Postgres, the documents
//! written to the search index, and the results that come back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw page row as fetched from the relational store, before projection.
///
/// Columns are addressed by name, never by position, so the projector does
/// not depend on the store's column order.
#[derive(Debug, Clone, Default)]
pub struct PageRow {
    pub id: Option<String>,
    pub page_content: Option<String>,
    pub filename: Option<String>,
    pub filepath: Option<String>,
    pub hashed_filename: Option<String>,
    pub hashed_filepath: Option<String>,
    pub hashed_page_content: Option<String>,
    pub page: Option<String>,
    pub lv1_cat: Option<String>,
    pub lv2_cat: Option<String>,
    pub lv3_cat: Option<String>,
    pub lv4_cat: Option<String>,
    /// Stored embedding in whatever shape the store kept it (delimited text,
    /// JSON array text, or nothing).
    pub embeddings: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of a source file, in the shape the search index stores it.
///
/// `id` is the index document key: re-indexing the same id overwrites.
/// `hashed_filepath` is the grouping key shared by every page of one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDocument {
    pub id: String,
    pub page_content: String,
    pub filename: String,
    pub filepath: String,
    pub hashed_filename: String,
    pub hashed_filepath: String,
    pub hashed_page_content: String,
    pub page: String,
    #[serde(default)]
    pub lv1_cat: String,
    #[serde(default)]
    pub lv2_cat: String,
    #[serde(default)]
    pub lv3_cat: String,
    #[serde(default)]
    pub lv4_cat: String,
    /// Empty when no embedding was stored or the stored value was
    /// unparseable. Omitted from the indexed document in that case.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A retrieved document annotated with its engine relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub score: f64,
    #[serde(flatten)]
    pub document: PageDocument,
}

/// Detail of one document the engine (or pre-flight validation) rejected.
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of one bulk sync call.
///
/// Per-document failures do not fail the call; they are accounted here and
/// the caller decides what to make of them. Only transport-level problems
/// surface as errors.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SyncReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// At most [`SyncReport::FAILURE_DETAIL_LIMIT`] entries, in encounter
    /// order. `failed` may exceed the list length.
    pub failures: Vec<BulkFailure>,
}

impl SyncReport {
    /// Cap on retained failure details; counts are always exact.
    pub const FAILURE_DETAIL_LIMIT: usize = 5;

    pub fn record_failure(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        self.failed += 1;
        if self.failures.len() < Self::FAILURE_DETAIL_LIMIT {
            self.failures.push(BulkFailure {
                id: id.into(),
                reason: reason.into(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_embeddings_omitted_from_json() {
        let doc = PageDocument {
            id: "p1".into(),
            page_content: "text".into(),
            filename: "a.pdf".into(),
            filepath: "/docs/a.pdf".into(),
            hashed_filename: "hf".into(),
            hashed_filepath: "hp".into(),
            hashed_page_content: "hc".into(),
            page: "1".into(),
            lv1_cat: String::new(),
            lv2_cat: String::new(),
            lv3_cat: String::new(),
            lv4_cat: String::new(),
            embeddings: Vec::new(),
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("embeddings").is_none());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["id"], "p1");
    }

    #[test]
    fn test_failure_details_bounded_but_counts_exact() {
        let mut report = SyncReport::default();
        for i in 0..8 {
            report.record_failure(format!("doc-{i}"), "mapper_parsing_exception");
        }

        assert_eq!(report.failed, 8);
        assert_eq!(report.failures.len(), SyncReport::FAILURE_DETAIL_LIMIT);
        assert_eq!(report.failures[0].id, "doc-0");
    }
}
