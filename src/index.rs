//! Index lifecycle management.
//!
//! All operations are idempotent from the caller's point of view:
//! `ensure_index` is a no-op when the index exists, and deleting an absent
//! index is a reported no-op rather than an error. Creation failures are
//! logged and surfaced — a missing index breaks every later operation, so
//! swallowing the error here would only move the blast radius.

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::elastic::ElasticClient;
use crate::error::{Error, Result};

/// Mapping for a page index with a dense-vector field of `dims` dimensions.
///
/// Identifier, hash, and category fields are exact-match keywords; only
/// `page_content` is analyzed full text.
pub fn page_index_mapping(dims: usize) -> Value {
    json!({
        "mappings": {
            "properties": {
                "id":                  { "type": "keyword" },
                "page_content":        { "type": "text" },
                "filename":            { "type": "keyword" },
                "filepath":            { "type": "keyword" },
                "hashed_filename":     { "type": "keyword" },
                "hashed_filepath":     { "type": "keyword" },
                "hashed_page_content": { "type": "keyword" },
                "page":                { "type": "keyword" },
                "lv1_cat":             { "type": "keyword" },
                "lv2_cat":             { "type": "keyword" },
                "lv3_cat":             { "type": "keyword" },
                "lv4_cat":             { "type": "keyword" },
                "embeddings": {
                    "type": "dense_vector",
                    "dims": dims
                },
                "created_at":          { "type": "date" },
                "updated_at":          { "type": "date" }
            }
        }
    })
}

/// Create `name` with the page mapping if it does not already exist.
pub async fn ensure_index(client: &ElasticClient, name: &str, dims: usize) -> Result<()> {
    if index_exists(client, name).await? {
        info!(index = name, "index already exists");
        return Ok(());
    }

    let response = client
        .http()
        .put(client.url(name))
        .json(&page_index_mapping(dims))
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        info!(index = name, dims, "index created");
        return Ok(());
    }

    let reason = response.text().await.unwrap_or_default();
    error!(index = name, %status, reason = %reason, "index creation failed");
    Err(Error::IndexCreate {
        index: name.to_string(),
        reason: format!("{status}: {reason}"),
    })
}

/// All index names known to the cluster.
pub async fn list_indices(client: &ElasticClient) -> Result<Vec<String>> {
    let response = client
        .http()
        .get(client.url("_alias"))
        .send()
        .await?
        .error_for_status()?;

    let body: Value = response.json().await?;
    let names = body
        .as_object()
        .ok_or_else(|| Error::Response("_alias response is not an object".to_string()))?
        .keys()
        .cloned()
        .collect();

    Ok(names)
}

/// Delete `name` if present. Returns whether a deletion actually happened;
/// absence is a no-op, not an error.
pub async fn delete_index(client: &ElasticClient, name: &str) -> Result<bool> {
    if !index_exists(client, name).await? {
        info!(index = name, "index does not exist, skipping deletion");
        return Ok(false);
    }

    client
        .http()
        .delete(client.url(name))
        .send()
        .await?
        .error_for_status()?;

    info!(index = name, "index deleted");
    Ok(true)
}

pub async fn index_exists(client: &ElasticClient, name: &str) -> Result<bool> {
    let response = client.http().head(client.url(name)).send().await?;

    match response.status() {
        StatusCode::OK => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        status => Err(Error::Response(format!(
            "existence check for '{name}' returned {status}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_has_all_document_fields() {
        let mapping = page_index_mapping(1024);
        let props = &mapping["mappings"]["properties"];

        for field in [
            "id",
            "page_content",
            "filename",
            "filepath",
            "hashed_filename",
            "hashed_filepath",
            "hashed_page_content",
            "page",
            "lv1_cat",
            "lv2_cat",
            "lv3_cat",
            "lv4_cat",
            "embeddings",
            "created_at",
            "updated_at",
        ] {
            assert!(props.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_mapping_field_types() {
        let mapping = page_index_mapping(1024);
        let props = &mapping["mappings"]["properties"];

        assert_eq!(props["page_content"]["type"], "text");
        assert_eq!(props["hashed_filepath"]["type"], "keyword");
        assert_eq!(props["embeddings"]["type"], "dense_vector");
        assert_eq!(props["embeddings"]["dims"], 1024);
        assert_eq!(props["created_at"]["type"], "date");
    }
}
