//! Row source abstraction over the relational store.
//!
//! The sync pipeline only ever sees [`RowSource`]; the Postgres
//! implementation is the thin default. A test double implementing the trait
//! is all it takes to drive the pipeline without a database.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::error::{Error, Result};
use crate::models::PageRow;

/// Yields the raw page rows for one group key.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch every row in `table` whose `hashed_filepath` equals
    /// `group_key`. Row order is unspecified. Zero rows is a normal
    /// outcome, not an error.
    async fn get_rows(&self, table: &str, group_key: &str) -> Result<Vec<PageRow>>;
}

/// Postgres-backed row source.
pub struct PgRowSource {
    pool: PgPool,
}

impl PgRowSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RowSource for PgRowSource {
    async fn get_rows(&self, table: &str, group_key: &str) -> Result<Vec<PageRow>> {
        validate_table_name(table)?;

        // Table names cannot be bound as parameters; the identifier check
        // above is what makes this interpolation safe.
        let query = format!(
            "SELECT id, page_content, filename, filepath, hashed_filename, \
             hashed_filepath, hashed_page_content, page, lv1_cat, lv2_cat, \
             lv3_cat, lv4_cat, embeddings, created_at, updated_at \
             FROM {table} WHERE hashed_filepath = $1"
        );

        let rows = sqlx::query(&query)
            .bind(group_key)
            .fetch_all(&self.pool)
            .await?;

        let pages = rows
            .iter()
            .map(|row| PageRow {
                id: row.try_get("id").ok(),
                page_content: row.try_get("page_content").ok(),
                filename: row.try_get("filename").ok(),
                filepath: row.try_get("filepath").ok(),
                hashed_filename: row.try_get("hashed_filename").ok(),
                hashed_filepath: row.try_get("hashed_filepath").ok(),
                hashed_page_content: row.try_get("hashed_page_content").ok(),
                page: row.try_get("page").ok(),
                lv1_cat: row.try_get("lv1_cat").ok(),
                lv2_cat: row.try_get("lv2_cat").ok(),
                lv3_cat: row.try_get("lv3_cat").ok(),
                lv4_cat: row.try_get("lv4_cat").ok(),
                embeddings: row.try_get("embeddings").ok(),
                created_at: row.try_get("created_at").ok(),
                updated_at: row.try_get("updated_at").ok(),
            })
            .collect();

        Ok(pages)
    }
}

/// Accept only plain SQL identifiers: ASCII alphanumerics and underscores,
/// not starting with a digit.
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidTableName(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_identifiers() {
        assert!(validate_table_name("pages").is_ok());
        assert!(validate_table_name("pjt_001").is_ok());
        assert!(validate_table_name("_staging").is_ok());
    }

    #[test]
    fn test_rejects_injection_shapes() {
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("1pages").is_err());
        assert!(validate_table_name("pages; DROP TABLE pages").is_err());
        assert!(validate_table_name("pages\"").is_err());
        assert!(validate_table_name("pa ges").is_err());
    }
}
