//! Row-to-document projection.
//!
//! Turns a [`PageRow`] fetched from the relational store into the
//! [`PageDocument`] shape the search index expects. Two rules govern this
//! boundary:
//!
//! - Data-quality problems degrade, they never raise. A malformed stored
//!   embedding becomes an empty vector; a missing optional field becomes an
//!   empty string.
//! - The `id` is the one mandatory field. A row without it cannot be keyed
//!   for upsert, so its absence is surfaced to the caller, which applies the
//!   configured [`MissingIdPolicy`](crate::config::MissingIdPolicy).
//!
//! Everything here is pure: no I/O, deterministic output for a given row.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{PageDocument, PageRow};

/// Parse a stored embedding into a flat `Vec<f32>`.
///
/// Accepts the representations the store is known to hold:
///
/// - delimited text such as `"{-0.07,0.12,...}"` or `"[0.1, 0.2]"`
/// - an already-decoded JSON array of numbers (or numeric strings)
/// - null / missing
///
/// Blank segments are skipped. If any individual value fails to parse, the
/// whole result is the empty vector — empty is the defined "no embedding"
/// state, and this function never errors.
pub fn parse_stored_embedding(value: &Value) -> Vec<f32> {
    match value {
        Value::Null => Vec::new(),
        Value::String(text) => parse_delimited(text),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let parsed = match item {
                    Value::Number(n) => n.as_f64().map(|f| f as f32),
                    Value::String(s) => s.trim().parse::<f32>().ok(),
                    _ => None,
                };
                match parsed {
                    Some(f) if f.is_finite() => out.push(f),
                    _ => return Vec::new(),
                }
            }
            out
        }
        _ => Vec::new(),
    }
}

fn parse_delimited(text: &str) -> Vec<f32> {
    let trimmed = text
        .trim()
        .trim_matches(|c| c == '{' || c == '}' || c == '[' || c == ']');

    let mut out = Vec::new();
    for segment in trimmed.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.parse::<f32>() {
            Ok(f) if f.is_finite() => out.push(f),
            _ => return Vec::new(),
        }
    }
    out
}

/// Project one raw row into an index document.
///
/// Fails only when the row has no id; every other field falls back to its
/// empty value. `position` is the row's offset within the fetched batch,
/// used for error context.
pub fn project_row(row: PageRow, group_key: &str, position: usize) -> Result<PageDocument> {
    let id = match row.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return Err(Error::MissingId {
                group_key: group_key.to_string(),
                position,
            })
        }
    };

    let embeddings = match row.embeddings {
        Some(text) => parse_stored_embedding(&Value::String(text)),
        None => Vec::new(),
    };

    Ok(PageDocument {
        id,
        page_content: row.page_content.unwrap_or_default(),
        filename: row.filename.unwrap_or_default(),
        filepath: row.filepath.unwrap_or_default(),
        hashed_filename: row.hashed_filename.unwrap_or_default(),
        hashed_filepath: row.hashed_filepath.unwrap_or_default(),
        hashed_page_content: row.hashed_page_content.unwrap_or_default(),
        page: row.page.unwrap_or_default(),
        lv1_cat: row.lv1_cat.unwrap_or_default(),
        lv2_cat: row.lv2_cat.unwrap_or_default(),
        lv3_cat: row.lv3_cat.unwrap_or_default(),
        lv4_cat: row.lv4_cat.unwrap_or_default(),
        embeddings,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Serialize a document for indexing.
///
/// This is the single JSON boundary for outbound documents: everything it
/// emits is a plain string, plain number, array of plain numbers, or an
/// ISO-8601 date string. Non-finite floats cannot occur because the parser
/// filters them.
pub fn document_source(doc: &PageDocument) -> Value {
    // PageDocument's serde derives already produce only JSON primitives.
    serde_json::to_value(doc).expect("PageDocument serialization is infallible")
}
