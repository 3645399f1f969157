//! Row store client
//!
//! PostgREST-style client for the two tables the service owns: content
//! records and store records. The pipeline never opens a transaction; each
//! call is one HTTP round-trip and each insert is atomic only for the row
//! set it submits.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::config::StoreServiceConfig;
use crate::types::{ContentRecord, StoreRecord};

/// Environment variable consulted when no API key is configured
const API_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Errors from the row store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("row store returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("configuration error: {0}")]
    Config(String),
}

/// Row-oriented persistent store for content and store records
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Find a content row whose `source_url` equals either form of the URL.
    async fn find_content_by_source_url(
        &self,
        original: &str,
        normalized: &str,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Bulk-insert content rows.
    async fn insert_contents(&self, rows: &[ContentRecord]) -> Result<(), StoreError>;

    /// Overwrite a store's live-news text (latest crawl wins).
    async fn update_store_news(&self, store_id: &str, raw_info: &str) -> Result<(), StoreError>;

    /// Create or replace a store record, keyed on `store_id`.
    async fn upsert_store(&self, store: &StoreRecord) -> Result<(), StoreError>;

    /// Most recent content rows, newest first by `created_at`.
    async fn recent_contents(&self, limit: usize) -> Result<Vec<ContentRecord>, StoreError>;

    /// Delete content rows by id, returning how many were removed.
    async fn delete_contents(&self, ids: &[Uuid]) -> Result<usize, StoreError>;
}

/// HTTP implementation of [`RowStore`]
pub struct HttpRowStore {
    client: reqwest::Client,
    endpoint: String,
    content_table: String,
    store_table: String,
}

impl HttpRowStore {
    pub fn new(config: &StoreServiceConfig) -> Result<Self, StoreError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &api_key {
            let header_value = HeaderValue::from_str(key)
                .map_err(|e| StoreError::Config(format!("invalid API key: {}", e)))?;
            headers.insert("apikey", header_value);
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| StoreError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, bearer);
        } else {
            warn!("No row store API key configured ({} unset)", API_KEY_ENV);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1", config.endpoint.trim_end_matches('/')),
            content_table: config.content_table.clone(),
            store_table: config.store_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.endpoint, table)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(StoreError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

#[async_trait]
impl RowStore for HttpRowStore {
    async fn find_content_by_source_url(
        &self,
        original: &str,
        normalized: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let filter = or_source_url_filter(original, normalized);
        let response = self
            .client
            .get(self.table_url(&self.content_table))
            .query(&[("select", "id"), ("or", filter.as_str()), ("limit", "1")])
            .send()
            .await?;
        let rows: Vec<IdRow> = Self::check(response).await?.json().await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn insert_contents(&self, rows: &[ContentRecord]) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url(&self.content_table))
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_store_news(&self, store_id: &str, raw_info: &str) -> Result<(), StoreError> {
        let key_filter = format!("eq.{}", store_id);
        let response = self
            .client
            .patch(self.table_url(&self.store_table))
            .query(&[("store_id", key_filter.as_str())])
            .json(&serde_json::json!({ "raw_info": raw_info }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upsert_store(&self, store: &StoreRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url(&self.store_table))
            .query(&[("on_conflict", "store_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[store])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn recent_contents(&self, limit: usize) -> Result<Vec<ContentRecord>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.table_url(&self.content_table))
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_contents(&self, ids: &[Uuid]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let id_filter = id_in_filter(ids);
        let response = self
            .client
            .delete(self.table_url(&self.content_table))
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<IdRow> = Self::check(response).await?.json().await?;
        Ok(deleted.len())
    }
}

/// Build the OR filter matching `source_url` against both URL forms.
/// Values are quoted so reserved characters in URLs cannot split the filter.
fn or_source_url_filter(original: &str, normalized: &str) -> String {
    format!(
        "(source_url.eq.\"{}\",source_url.eq.\"{}\")",
        original, normalized
    )
}

/// Build the `in` filter for a list of row ids.
fn id_in_filter(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({})", joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_filter_quotes_both_forms() {
        let filter = or_source_url_filter(
            "https://blog.naver.com/?blogId=a&logNo=1",
            "https://m.blog.naver.com/a/1",
        );
        assert_eq!(
            filter,
            "(source_url.eq.\"https://blog.naver.com/?blogId=a&logNo=1\",source_url.eq.\"https://m.blog.naver.com/a/1\")"
        );
    }

    #[test]
    fn test_id_in_filter() {
        let a = Uuid::nil();
        let filter = id_in_filter(&[a, a]);
        assert_eq!(
            filter,
            "in.(00000000-0000-0000-0000-000000000000,00000000-0000-0000-0000-000000000000)"
        );
    }
}
