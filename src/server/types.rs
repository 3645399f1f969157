//! HTTP API Request/Response Types
//!
//! The response envelope follows the dashboard's expectations: successes
//! are HTTP 200 with `success: true`, every pipeline failure is HTTP 500
//! with `success: false` and the raw underlying error text. There is no
//! finer status-code taxonomy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::UrlFailure;
use crate::types::{CollectionMode, ContentRecord, ExtractedItem};

/// Single-URL collection request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectBody {
    pub url: String,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub collection_mode: Option<CollectionMode>,
    #[serde(default)]
    pub store_id: Option<String>,
}

/// Single-URL collection response
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ExtractedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CollectResponse {
    pub fn inserted(count: usize, items: Vec<ExtractedItem>) -> Self {
        Self {
            success: true,
            count,
            data: items,
            message: None,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            success: true,
            count: 0,
            data: Vec::new(),
            message: Some("URL duplicate".to_string()),
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            count: 0,
            data: Vec::new(),
            message: None,
        }
    }
}

/// Batch collection request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
    pub keyword: String,
    #[serde(default)]
    pub collection_mode: Option<CollectionMode>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub store_id: Option<String>,
}

/// Batch collection response
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub attempted: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub empty: usize,
    pub failures: Vec<UrlFailure>,
}

/// Keyword search request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub keyword: String,
    #[serde(default)]
    pub collection_mode: Option<CollectionMode>,
}

/// Keyword search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub urls: Vec<String>,
}

/// Store upsert request body (the manual live-news edit path)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpsertBody {
    pub store_id: String,
    pub store_name: String,
    pub raw_info: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ai_structured_data: Option<serde_json::Value>,
}

/// Recent contents listing response
#[derive(Debug, Serialize)]
pub struct ContentsResponse {
    pub success: bool,
    pub data: Vec<ContentRecord>,
}

/// Content deletion request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBody {
    pub ids: Vec<Uuid>,
}

/// Content deletion response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: usize,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { success: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_body_accepts_camel_case() {
        let body: CollectBody = serde_json::from_str(
            r#"{"url":"https://a","groupName":"g","collectionMode":"store","storeId":"s"}"#,
        )
        .unwrap();
        assert_eq!(body.group_name.as_deref(), Some("g"));
        assert_eq!(body.collection_mode, Some(CollectionMode::Store));
        assert_eq!(body.store_id.as_deref(), Some("s"));
    }

    #[test]
    fn test_duplicate_response_envelope() {
        let json = serde_json::to_value(CollectResponse::duplicate()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 0);
        assert_eq!(json["message"], "URL duplicate");
    }

    #[test]
    fn test_empty_response_omits_message() {
        let json = serde_json::to_value(CollectResponse::empty()).unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["data"], serde_json::json!([]));
    }

    #[test]
    fn test_error_envelope() {
        let json = serde_json::to_value(ErrorResponse::new("fetch failed: boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "fetch failed: boom");
    }
}
