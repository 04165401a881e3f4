//! Bulk synchronization of page rows into the search index.
//!
//! One call moves every row sharing a group key (`hashed_filepath`) from the
//! row source into the index as a single `_bulk` upsert keyed by document
//! id. Re-running the same call is safe: same ids, same content, same end
//! state.
//!
//! Failure policy, in order of severity:
//!
//! - zero rows for the key → log, return an empty report (not an error)
//! - a row the projector or pre-flight check rejects → counted as failed
//!   in the report, the rest of the batch proceeds
//! - a document the engine rejects → counted as failed, batch proceeds
//! - engine unreachable → the whole call errors

use serde_json::Value;
use tracing::{info, warn};

use crate::config::MissingIdPolicy;
use crate::elastic::ElasticClient;
use crate::error::{Error, Result};
use crate::models::{PageDocument, SyncReport};
use crate::project::{document_source, project_row};
use crate::rows::RowSource;

/// Sync every row for `group_key` in `table` into `index`.
pub async fn sync_group(
    client: &ElasticClient,
    source: &dyn RowSource,
    index: &str,
    table: &str,
    group_key: &str,
    dims: usize,
    missing_id: MissingIdPolicy,
) -> Result<SyncReport> {
    info!(table, group_key, "fetching rows for group key");
    let rows = source.get_rows(table, group_key).await?;

    if rows.is_empty() {
        warn!(table, group_key, "no rows found for group key");
        return Ok(SyncReport::default());
    }

    let mut report = SyncReport {
        attempted: rows.len(),
        ..SyncReport::default()
    };

    let mut documents = Vec::with_capacity(rows.len());
    for (position, row) in rows.into_iter().enumerate() {
        let had_stored_embedding = row
            .embeddings
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());

        let doc = match project_row(row, group_key, position) {
            Ok(doc) => doc,
            Err(err @ Error::MissingId { .. }) => match missing_id {
                MissingIdPolicy::Abort => return Err(err),
                MissingIdPolicy::Skip => {
                    warn!(group_key, position, "skipping row without id");
                    report.record_failure(format!("<row {position}>"), err.to_string());
                    continue;
                }
            },
            Err(err) => return Err(err),
        };

        if had_stored_embedding && doc.embeddings.is_empty() {
            warn!(id = %doc.id, "stored embedding unparseable, indexing without vector");
        }

        // A present-but-wrong-length vector violates the index contract and
        // would be rejected by the engine anyway; stop it here.
        if !doc.embeddings.is_empty() && doc.embeddings.len() != dims {
            warn!(
                id = %doc.id,
                got = doc.embeddings.len(),
                expected = dims,
                "rejecting document with wrong embedding dimension"
            );
            report.record_failure(
                doc.id.clone(),
                format!(
                    "invalid embedding dimension: expected {dims}, got {}",
                    doc.embeddings.len()
                ),
            );
            continue;
        }

        documents.push(doc);
    }

    if documents.is_empty() {
        warn!(group_key, "no indexable documents after projection");
        return Ok(report);
    }

    let body = bulk_body(index, &documents);
    let response = client
        .http()
        .post(client.url("_bulk"))
        .header("Content-Type", "application/x-ndjson")
        .body(body)
        .send()
        .await?
        .error_for_status()?;

    let response: Value = response.json().await?;
    apply_bulk_response(&response, &mut report)?;

    if report.failed > 0 {
        warn!(
            group_key,
            failed = report.failed,
            first_failure = report.failures.first().map(|f| f.reason.as_str()),
            "some documents failed to index"
        );
    }
    info!(
        group_key,
        index,
        succeeded = report.succeeded,
        failed = report.failed,
        attempted = report.attempted,
        "bulk sync finished"
    );

    Ok(report)
}

/// NDJSON payload for the `_bulk` endpoint: an `index` action line followed
/// by the document source, per document, keyed by the document id.
pub fn bulk_body(index: &str, documents: &[PageDocument]) -> String {
    let mut body = String::new();
    for doc in documents {
        let action = serde_json::json!({
            "index": { "_index": index, "_id": doc.id }
        });
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&document_source(doc).to_string());
        body.push('\n');
    }
    body
}

/// Fold the engine's `_bulk` response into the report.
///
/// Each item with a 2xx status counts as succeeded; anything else is a
/// per-document failure with the engine's reason retained (bounded).
pub fn apply_bulk_response(response: &Value, report: &mut SyncReport) -> Result<()> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Response("bulk response missing items array".to_string()))?;

    for item in items {
        // Every item is wrapped in its action name; we only send "index".
        let result = item
            .get("index")
            .ok_or_else(|| Error::Response("bulk item missing index action".to_string()))?;

        let status = result.get("status").and_then(Value::as_u64).unwrap_or(0);
        if (200..300).contains(&status) {
            report.succeeded += 1;
        } else {
            let id = result
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>");
            let reason = result
                .get("error")
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("status {status}"));
            report.record_failure(id, reason);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str) -> PageDocument {
        PageDocument {
            id: id.to_string(),
            page_content: "content".to_string(),
            filename: "f.pdf".to_string(),
            filepath: "/f.pdf".to_string(),
            hashed_filename: "hf".to_string(),
            hashed_filepath: "hp".to_string(),
            hashed_page_content: "hc".to_string(),
            page: "1".to_string(),
            lv1_cat: String::new(),
            lv2_cat: String::new(),
            lv3_cat: String::new(),
            lv4_cat: String::new(),
            embeddings: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_bulk_body_pairs_action_and_source_lines() {
        let body = bulk_body("pages", &[doc("a"), doc("b")]);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);

        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_index"], "pages");
        assert_eq!(action["index"]["_id"], "a");

        let source: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(source["id"], "a");

        let action_b: Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(action_b["index"]["_id"], "b");

        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_bulk_body_is_idempotent_input() {
        // Same documents produce byte-identical payloads, so re-running a
        // sync re-submits the same id-keyed upserts.
        let docs = vec![doc("a"), doc("b")];
        assert_eq!(bulk_body("pages", &docs), bulk_body("pages", &docs));
    }

    #[test]
    fn test_apply_bulk_response_counts_partial_failure() {
        // Five documents, one rejected: 4 succeeded / 1 failed, no error.
        let response = json!({
            "errors": true,
            "items": [
                { "index": { "_id": "a", "status": 201 } },
                { "index": { "_id": "b", "status": 200 } },
                { "index": { "_id": "c", "status": 400,
                    "error": { "type": "mapper_parsing_exception",
                               "reason": "failed to parse field [embeddings]" } } },
                { "index": { "_id": "d", "status": 201 } },
                { "index": { "_id": "e", "status": 201 } }
            ]
        });

        let mut report = SyncReport {
            attempted: 5,
            ..SyncReport::default()
        };
        apply_bulk_response(&response, &mut report).unwrap();

        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "c");
        assert!(report.failures[0].reason.contains("mapper_parsing_exception"));
    }

    #[test]
    fn test_apply_bulk_response_all_succeeded() {
        let response = json!({
            "errors": false,
            "items": [
                { "index": { "_id": "a", "status": 200 } },
                { "index": { "_id": "b", "status": 201 } }
            ]
        });

        let mut report = SyncReport {
            attempted: 2,
            ..SyncReport::default()
        };
        apply_bulk_response(&response, &mut report).unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_apply_bulk_response_rejects_malformed_payload() {
        let mut report = SyncReport::default();
        assert!(apply_bulk_response(&json!({ "errors": false }), &mut report).is_err());
        assert!(apply_bulk_response(&json!({ "items": [{}] }), &mut report).is_err());
    }

    #[test]
    fn test_failure_details_bounded_in_large_batch() {
        let items: Vec<Value> = (0..20)
            .map(|i| {
                json!({ "index": { "_id": format!("doc-{i}"), "status": 400,
                    "error": { "reason": "boom" } } })
            })
            .collect();
        let response = json!({ "errors": true, "items": items });

        let mut report = SyncReport {
            attempted: 20,
            ..SyncReport::default()
        };
        apply_bulk_response(&response, &mut report).unwrap();

        assert_eq!(report.failed, 20);
        assert_eq!(report.failures.len(), SyncReport::FAILURE_DETAIL_LIMIT);
    }
}
