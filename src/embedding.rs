//! Query embedding via a local Ollama instance.
//!
//! Calls `POST /api/embed` on the configured URL (default
//! `http://localhost:11434`) with the configured model. Used only to embed
//! search queries — stored page embeddings arrive pre-computed through the
//! row source. A failure here is the caller's to handle; hybrid search
//! degrades to keyword-only.

use std::time::Duration;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::config::EmbeddingConfig;

/// Embed a single query text.
///
/// # Errors
///
/// Fails when Ollama is unreachable, answers with a non-success status, or
/// returns a vector of the wrong dimensionality.
pub async fn embed_query(config: &EmbeddingConfig, text: &str) -> Result<Vec<f32>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": config.model,
        "input": text,
    });

    let response = client
        .post(format!("{}/api/embed", config.url.trim_end_matches('/')))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        bail!("Ollama embed error {status}: {detail}");
    }

    let json: Value = response.json().await?;
    let vector = parse_embed_response(&json)?;

    if vector.len() != config.dims {
        bail!(
            "embedding model returned {} dimensions, expected {}",
            vector.len(),
            config.dims
        );
    }

    Ok(vector)
}

/// Extract the first vector from an Ollama `/api/embed` response.
fn parse_embed_response(json: &Value) -> Result<Vec<f32>> {
    let first = json
        .get("embeddings")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("Invalid embed response: missing embeddings array"))?;

    Ok(first
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}
