//! Core domain types shared across the pipeline, services, and HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a content record was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Broad keyword net-search collection
    #[default]
    Net,
    /// Targeted single-store collection
    Store,
    /// Single-URL precision ingestion
    Sniper,
}

impl CollectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Net => "net",
            Self::Store => "store",
            Self::Sniper => "sniper",
        }
    }
}

impl std::fmt::Display for CollectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingested piece of external content.
///
/// `id` and `created_at` are assigned by the row store on insert and are
/// absent on outbound rows. `source_url` is the dedup key: at most one row
/// per distinct value under normal operation, enforced by the duplicate
/// guard as a pre-check rather than a storage constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub source_url: String,
    pub image_url: Option<String>,
    pub group_name: Option<String>,
    pub collection_mode: CollectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One managed store and its current public-facing text/image.
///
/// Upserted keyed on `store_id`; all fields are last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_id: String,
    pub store_name: String,
    /// Current "live news" text, overwritten by manual edits or by the
    /// pipeline when a crawl targets this store.
    pub raw_info: String,
    pub image_url: Option<String>,
    /// Opaque structured markup for search-engine consumption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_structured_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One item produced by the extraction stage.
///
/// The model is prompted to return a JSON array of these. Missing fields
/// default to empty rather than failing the whole parse; `reason` explains
/// the image pick (or its absence) and is logged, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}
