use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub elastic: ElasticConfig,
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElasticConfig {
    #[serde(default = "default_elastic_url")]
    pub url: String,
    /// Default index targeted by `init`, `sync`, `get`, and `search`.
    pub index: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_elastic_url() -> String {
    "http://localhost:9200".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PostgresConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Dense-vector dimensionality of the index mapping. Every vector that
    /// crosses into the engine is checked against this.
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_model(),
            dims: default_dims(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "bge-m3".to_string()
}
fn default_dims() -> usize {
    1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_text_boost")]
    pub text_boost: f64,
    #[serde(default = "default_vector_boost")]
    pub vector_boost: f64,
    /// kNN candidate pool is `max(size * candidate_multiplier, candidate_floor)`.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_candidate_floor")]
    pub candidate_floor: usize,
    #[serde(default = "default_size")]
    pub default_size: usize,
    #[serde(default = "default_min_score")]
    pub default_min_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            text_boost: default_text_boost(),
            vector_boost: default_vector_boost(),
            candidate_multiplier: default_candidate_multiplier(),
            candidate_floor: default_candidate_floor(),
            default_size: default_size(),
            default_min_score: default_min_score(),
        }
    }
}

fn default_text_boost() -> f64 {
    1.0
}
fn default_vector_boost() -> f64 {
    0.8
}
fn default_candidate_multiplier() -> usize {
    10
}
fn default_candidate_floor() -> usize {
    50
}
fn default_size() -> usize {
    5
}
fn default_min_score() -> f64 {
    0.5
}

/// What to do with a fetched row that has no id.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingIdPolicy {
    /// Log a warning, count the row as failed, keep going.
    Skip,
    /// Fail the whole sync call.
    Abort,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_missing_id")]
    pub missing_id: MissingIdPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            missing_id: default_missing_id(),
        }
    }
}

fn default_missing_id() -> MissingIdPolicy {
    MissingIdPolicy::Skip
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.elastic.index.trim().is_empty() {
        anyhow::bail!("elastic.index must not be empty");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    if config.retrieval.text_boost <= 0.0 || config.retrieval.vector_boost <= 0.0 {
        anyhow::bail!("retrieval boosts must be > 0");
    }

    if config.retrieval.candidate_multiplier == 0 {
        anyhow::bail!("retrieval.candidate_multiplier must be >= 1");
    }

    if config.retrieval.default_size == 0 {
        anyhow::bail!("retrieval.default_size must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.retrieval.default_min_score) {
        anyhow::bail!("retrieval.default_min_score must be in [0.0, 1.0]");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const MINIMAL: &str = r#"
[elastic]
index = "pages"

[postgres]
url = "postgres://localhost/docs"
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.elastic.url, "http://localhost:9200");
        assert_eq!(config.embedding.dims, 1024);
        assert_eq!(config.embedding.model, "bge-m3");
        assert!((config.retrieval.text_boost - 1.0).abs() < f64::EPSILON);
        assert!((config.retrieval.vector_boost - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.retrieval.candidate_multiplier, 10);
        assert_eq!(config.retrieval.candidate_floor, 50);
        assert_eq!(config.sync.missing_id, MissingIdPolicy::Skip);
    }

    #[test]
    fn test_rejects_zero_dims() {
        let file = write_config(
            r#"
[elastic]
index = "pages"

[postgres]
url = "postgres://localhost/docs"

[embedding]
dims = 0
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_rejects_empty_index() {
        let file = write_config(
            r#"
[elastic]
index = ""

[postgres]
url = "postgres://localhost/docs"
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_id_abort_parses() {
        let file = write_config(
            r#"
[elastic]
index = "pages"

[postgres]
url = "postgres://localhost/docs"

[sync]
missing_id = "abort"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sync.missing_id, MissingIdPolicy::Abort);
    }
}
