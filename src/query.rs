//! Hybrid query composition.
//!
//! Builds the single search body combining a lexical `match` clause against
//! `page_content` and a kNN clause against `embeddings`. Pure function, all
//! validation up front: an impossible query never reaches the engine.
//!
//! The two clauses combine disjunctively — a hit matching either qualifies —
//! and their scores add, each weighted by its own boost. The vector boost
//! sits below the lexical one so exact keyword matches are not drowned out
//! by near-neighbor noise.

use serde_json::{json, Value};

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};

/// Inputs for one search call. At least one of `text` / `vector` must be set.
#[derive(Debug, Clone, Default)]
pub struct SearchParams<'a> {
    pub text: Option<&'a str>,
    pub vector: Option<&'a [f32]>,
    pub size: usize,
    pub min_score: f64,
}

/// Compose the search request body.
///
/// `dims` is the index's dense-vector dimensionality; a vector of any other
/// length is rejected with the received length in the error.
pub fn build_search_body(
    params: &SearchParams<'_>,
    retrieval: &RetrievalConfig,
    dims: usize,
) -> Result<Value> {
    let text = params.text.map(str::trim).filter(|t| !t.is_empty());

    if text.is_none() && params.vector.is_none() {
        return Err(Error::EmptyQuery);
    }

    let mut body = json!({
        "size": params.size,
        "min_score": params.min_score,
    });

    if let Some(text) = text {
        body["query"] = json!({
            "bool": {
                "should": [
                    {
                        "match": {
                            "page_content": {
                                "query": text,
                                "boost": retrieval.text_boost,
                            }
                        }
                    }
                ],
                "minimum_should_match": 1,
            }
        });
    }

    if let Some(vector) = params.vector {
        if vector.len() != dims {
            return Err(Error::InvalidDimension {
                expected: dims,
                actual: vector.len(),
            });
        }

        body["knn"] = json!([
            {
                "field": "embeddings",
                "query_vector": vector,
                "k": params.size,
                "num_candidates": candidate_pool(params.size, retrieval),
                "boost": retrieval.vector_boost,
            }
        ]);
    }

    Ok(body)
}

/// Candidate pool for the kNN clause: `max(size * multiplier, floor)`.
///
/// Small result sizes get a proportionally wider pool, trading a little
/// latency for recall.
pub fn candidate_pool(size: usize, retrieval: &RetrievalConfig) -> usize {
    (size * retrieval.candidate_multiplier).max(retrieval.candidate_floor)
}
