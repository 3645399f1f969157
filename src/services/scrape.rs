//! Scraping service client
//!
//! Thin client over a Firecrawl-style API. Two operations are used:
//! rendered-page markdown for a single URL, and keyword search returning
//! candidate URLs. The service's response shape varies by version (content
//! may sit at `data.markdown` or at the top level), so both paths are
//! checked before declaring the response unusable.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ScrapeServiceConfig;

/// Environment variable consulted when no API key is configured
const API_KEY_ENV: &str = "FIRECRAWL_API_KEY";

/// Errors from the scraping service
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("scrape service returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("scrape response contained no markdown content")]
    MissingContent,
    #[error("configuration error: {0}")]
    Config(String),
}

/// Client for the external scraping service
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    /// Fetch the rendered page text for a URL as markdown.
    async fn scrape_markdown(&self, url: &str) -> Result<String, ScrapeError>;

    /// Search for pages matching a query, returning result URLs.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, ScrapeError>;
}

/// HTTP implementation of [`ScrapeClient`]
pub struct HttpScrapeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScrapeClient {
    pub fn new(config: &ScrapeServiceConfig) -> Result<Self, ScrapeError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| ScrapeError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        } else {
            warn!("No scrape service API key configured ({} unset)", API_KEY_ENV);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ScrapeError> {
        let response = self
            .client
            .post(format!("{}{}", self.endpoint, path))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ScrapeClient for HttpScrapeClient {
    async fn scrape_markdown(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("Scraping {}", url);
        let body = json!({ "url": url, "formats": ["markdown"] });
        let response = self.post_json("/scrape", body).await?;
        markdown_from_response(&response).ok_or(ScrapeError::MissingContent)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
        debug!("Searching scrape service: {}", query);
        let body = json!({ "query": query, "limit": limit });
        let response = self.post_json("/search", body).await?;
        Ok(urls_from_search_response(&response))
    }
}

/// Pull markdown out of a scrape response, checking both known shapes.
fn markdown_from_response(response: &Value) -> Option<String> {
    response
        .pointer("/data/markdown")
        .or_else(|| response.get("markdown"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Pull result URLs out of a search response, checking both known shapes.
fn urls_from_search_response(response: &Value) -> Vec<String> {
    let results = response
        .get("data")
        .or_else(|| response.get("web"))
        .and_then(Value::as_array);

    match results {
        Some(items) => items
            .iter()
            .filter_map(|item| item.get("url").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_nested_shape() {
        let v = json!({ "data": { "markdown": "# hello" } });
        assert_eq!(markdown_from_response(&v).as_deref(), Some("# hello"));
    }

    #[test]
    fn test_markdown_flat_shape() {
        let v = json!({ "markdown": "plain" });
        assert_eq!(markdown_from_response(&v).as_deref(), Some("plain"));
    }

    #[test]
    fn test_markdown_missing() {
        let v = json!({ "data": { "html": "<p>x</p>" } });
        assert!(markdown_from_response(&v).is_none());
    }

    #[test]
    fn test_search_urls_data_shape() {
        let v = json!({ "data": [
            { "url": "https://blog.naver.com/a/1", "title": "a" },
            { "url": "https://tistory.com/b", "title": "b" },
            { "title": "no url" },
        ]});
        assert_eq!(
            urls_from_search_response(&v),
            vec!["https://blog.naver.com/a/1", "https://tistory.com/b"]
        );
    }

    #[test]
    fn test_search_urls_web_shape() {
        let v = json!({ "web": [{ "url": "https://example.com" }] });
        assert_eq!(urls_from_search_response(&v), vec!["https://example.com"]);
    }

    #[test]
    fn test_search_urls_empty() {
        assert!(urls_from_search_response(&json!({})).is_empty());
    }
}
