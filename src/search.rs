//! Retrieval against the search index.
//!
//! Two entry points: fetch every page of one source file by its group key,
//! or run a composed keyword/vector search. An absent index and an empty
//! result set both come back as an empty list — only argument validation and
//! transport problems are errors.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::RetrievalConfig;
use crate::elastic::ElasticClient;
use crate::error::{Error, Result};
use crate::models::{PageDocument, ScoredDocument};
use crate::query::{build_search_body, SearchParams};

/// Hard ceiling on documents returned per group key. Bounds worst-case
/// memory for pathologically large source files; not configurable per call.
pub const GROUP_FETCH_LIMIT: usize = 10_000;

/// Every document sharing `group_key`, unordered.
pub async fn fetch_by_group_key(
    client: &ElasticClient,
    index: &str,
    group_key: &str,
) -> Result<Vec<PageDocument>> {
    let body = serde_json::json!({
        "query": {
            "term": { "hashed_filepath": group_key }
        },
        "size": GROUP_FETCH_LIMIT,
    });

    info!(index, group_key, "fetching documents by group key");
    let Some(response) = execute(client, index, &body).await? else {
        return Ok(Vec::new());
    };

    let documents: Vec<PageDocument> = parse_hits(&response)?
        .into_iter()
        .map(|hit| hit.document)
        .collect();

    info!(index, group_key, count = documents.len(), "group fetch finished");
    Ok(documents)
}

/// Run a hybrid search and return scored documents, best first.
///
/// Ordering is the engine's score-descending ranking; the result count is
/// capped by `params.size` and floored by `params.min_score`.
pub async fn search(
    client: &ElasticClient,
    index: &str,
    params: &SearchParams<'_>,
    retrieval: &RetrievalConfig,
    dims: usize,
) -> Result<Vec<ScoredDocument>> {
    let body = build_search_body(params, retrieval, dims)?;

    info!(
        index,
        text = params.text.unwrap_or(""),
        vector = params.vector.is_some(),
        size = params.size,
        "executing search"
    );
    let Some(response) = execute(client, index, &body).await? else {
        return Ok(Vec::new());
    };

    let hits = parse_hits(&response)?;
    info!(index, count = hits.len(), "search finished");
    Ok(hits)
}

/// POST the body to `{index}/_search`. `None` means the index is absent,
/// which callers treat as an empty result.
async fn execute(client: &ElasticClient, index: &str, body: &Value) -> Result<Option<Value>> {
    let response = client
        .http()
        .post(client.url(&format!("{index}/_search")))
        .json(body)
        .send()
        .await?;

    if response.status() == StatusCode::NOT_FOUND {
        warn!(index, "index not found, returning empty result");
        return Ok(None);
    }

    let response = response.error_for_status()?;
    Ok(Some(response.json().await?))
}

/// Decode `hits.hits` into scored documents.
pub fn parse_hits(response: &Value) -> Result<Vec<ScoredDocument>> {
    let hits = response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Response("search response missing hits".to_string()))?;

    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let source = hit
            .get("_source")
            .ok_or_else(|| Error::Response("hit missing _source".to_string()))?;
        let document: PageDocument = serde_json::from_value(source.clone())
            .map_err(|e| Error::Response(format!("undecodable hit source: {e}")))?;
        let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);

        results.push(ScoredDocument { score, document });
    }

    Ok(results)
}
