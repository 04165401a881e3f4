//! End-to-end tests over the pure pipeline: rows are projected into
//! documents, documents into a bulk payload, and a canned engine response
//! into a sync report. No database or search engine required.

use serde_json::Value;

use docsync::config::RetrievalConfig;
use docsync::models::{PageRow, SyncReport};
use docsync::project::project_row;
use docsync::query::{build_search_body, SearchParams};
use docsync::sync::{apply_bulk_response, bulk_body};

fn page_row(id: &str, page: u32, embedding: Option<&str>) -> PageRow {
    PageRow {
        id: Some(id.to_string()),
        page_content: Some(format!("content of page {page}")),
        filename: Some("whitepaper.pdf".to_string()),
        filepath: Some("/docs/whitepaper.pdf".to_string()),
        hashed_filename: Some("f4a1".to_string()),
        hashed_filepath: Some("abc123".to_string()),
        hashed_page_content: Some(format!("c{page:03}")),
        page: Some(page.to_string()),
        embeddings: embedding.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn rows_flow_through_projection_into_a_bulk_payload() {
    let rows = vec![
        page_row("p1", 1, Some("{0.1,0.2}")),
        page_row("p2", 2, None),
        page_row("p3", 3, Some("not-a-vector")),
    ];

    let documents: Vec<_> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| project_row(row, "abc123", i).unwrap())
        .collect();

    // Malformed and absent embeddings both degrade to empty, never error.
    assert_eq!(documents[0].embeddings, vec![0.1, 0.2]);
    assert!(documents[1].embeddings.is_empty());
    assert!(documents[2].embeddings.is_empty());

    let body = bulk_body("pages", &documents);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 6);

    // Upsert keys come from the document ids, so resubmission overwrites.
    let action: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(action["index"]["_id"], "p1");

    // Documents without an embedding must not carry the field at all.
    let p2_source: Value = serde_json::from_str(lines[3]).unwrap();
    assert!(p2_source.get("embeddings").is_none());
    assert_eq!(p2_source["hashed_filepath"], "abc123");
}

#[test]
fn bulk_report_accounts_partial_failure_without_failing() {
    let documents: Vec<_> = (1..=5)
        .map(|p| project_row(page_row(&format!("p{p}"), p, None), "abc123", 0).unwrap())
        .collect();

    let mut report = SyncReport {
        attempted: documents.len(),
        ..SyncReport::default()
    };

    let response = serde_json::json!({
        "errors": true,
        "items": [
            { "index": { "_id": "p1", "status": 201 } },
            { "index": { "_id": "p2", "status": 201 } },
            { "index": { "_id": "p3", "status": 400,
                "error": { "type": "mapper_parsing_exception", "reason": "bad field" } } },
            { "index": { "_id": "p4", "status": 201 } },
            { "index": { "_id": "p5", "status": 201 } }
        ]
    });

    apply_bulk_response(&response, &mut report).unwrap();

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].id, "p3");
}

#[test]
fn hybrid_body_carries_independent_boosts_and_score_floor() {
    let vector = vec![0.01_f32; 1024];
    let params = SearchParams {
        text: Some("energy policy"),
        vector: Some(&vector),
        size: 5,
        min_score: 0.5,
    };

    let body = build_search_body(&params, &RetrievalConfig::default(), 1024).unwrap();

    assert_eq!(body["size"], 5);
    assert_eq!(body["min_score"], 0.5);
    assert_eq!(
        body["query"]["bool"]["should"][0]["match"]["page_content"]["boost"],
        1.0
    );
    assert_eq!(body["query"]["bool"]["minimum_should_match"], 1);

    let knn = &body["knn"][0];
    assert_eq!(knn["boost"], 0.8);
    assert_eq!(knn["k"], 5);
    assert_eq!(knn["num_candidates"], 50);
}

#[test]
fn query_builder_rejects_wrong_dimension_before_any_io() {
    let vector = vec![0.0_f32; 512];
    let params = SearchParams {
        text: None,
        vector: Some(&vector),
        size: 10,
        min_score: 0.0,
    };

    let err = build_search_body(&params, &RetrievalConfig::default(), 1024).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("1024"));
    assert!(msg.contains("512"));
}
