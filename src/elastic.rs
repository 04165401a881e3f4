//! Thin Elasticsearch HTTP client.
//!
//! Speaks the engine's JSON API directly over [`reqwest`]. The client is
//! cheap to clone and safe to share across concurrent calls; each request is
//! bounded by the configured timeout, and a timeout is a transport error
//! like any other connection failure.

use std::time::Duration;

use crate::config::ElasticConfig;
use crate::error::Result;

#[derive(Clone)]
pub struct ElasticClient {
    http: reqwest::Client,
    base_url: String,
}

impl ElasticClient {
    pub fn new(config: &ElasticConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
