//! Persistence writer
//!
//! Maps extracted items to content rows, bulk-inserts them, and — when a
//! target store is known — synchronizes that store's live-news text with
//! the first item's summary. The sync is deliberately latest-crawl-wins,
//! gated by the store's write generation so a slow crawl cannot clobber a
//! fresher write (see [`super::sync_gate`]).

use std::sync::Arc;

use tracing::{info, warn};

use super::sync_gate::SyncGate;
use super::CollectRequest;
use crate::services::{RowStore, StoreError};
use crate::types::{ContentRecord, ExtractedItem};

/// Writes pipeline output to the row store
pub struct PersistenceWriter {
    store: Arc<dyn RowStore>,
    sync_gate: Arc<SyncGate>,
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn RowStore>, sync_gate: Arc<SyncGate>) -> Self {
        Self { store, sync_gate }
    }

    /// Insert the extracted items and run the store sync if applicable.
    ///
    /// Any storage error aborts the whole operation; no partial-row cleanup
    /// is attempted (the insert is atomic per call for the rows it submits).
    pub async fn persist(
        &self,
        items: &[ExtractedItem],
        target_url: &str,
        request: &CollectRequest,
        sync_snapshot: Option<u64>,
    ) -> Result<usize, StoreError> {
        let rows = build_rows(items, target_url, request);
        self.store.insert_contents(&rows).await?;

        if let (Some(store_id), Some(snapshot)) = (request.store_id.as_deref(), sync_snapshot) {
            if let Some(first) = items.first() {
                if self.sync_gate.try_commit(store_id, snapshot) {
                    self.store.update_store_news(store_id, &first.content).await?;
                    info!("Store {} live news synchronized", store_id);
                } else {
                    warn!(
                        "Store {} was written since this collect started, skipping news sync",
                        store_id
                    );
                }
            }
        }

        Ok(rows.len())
    }
}

/// Map extracted items to content rows.
fn build_rows(
    items: &[ExtractedItem],
    target_url: &str,
    request: &CollectRequest,
) -> Vec<ContentRecord> {
    let group_name = request
        .group_name
        .clone()
        .or_else(|| request.store_id.clone());

    items
        .iter()
        .map(|item| ContentRecord {
            id: None,
            title: item.title.clone(),
            content: item.content.clone(),
            category: item.category.clone(),
            source_url: target_url.to_string(),
            image_url: item.image_url.clone(),
            group_name: group_name.clone(),
            collection_mode: request.collection_mode.unwrap_or_default(),
            created_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StoreError;
    use crate::types::{CollectionMode, StoreRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingStore {
        inserted: Mutex<Vec<ContentRecord>>,
        news: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl RowStore for RecordingStore {
        async fn find_content_by_source_url(
            &self,
            _original: &str,
            _normalized: &str,
        ) -> Result<Option<Uuid>, StoreError> {
            Ok(None)
        }

        async fn insert_contents(&self, rows: &[ContentRecord]) -> Result<(), StoreError> {
            self.inserted.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }

        async fn update_store_news(&self, id: &str, info: &str) -> Result<(), StoreError> {
            self.news
                .lock()
                .unwrap()
                .push((id.to_string(), info.to_string()));
            Ok(())
        }

        async fn upsert_store(&self, _store: &StoreRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn recent_contents(&self, _limit: usize) -> Result<Vec<ContentRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete_contents(&self, _ids: &[Uuid]) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    fn item(title: &str, content: &str) -> ExtractedItem {
        ExtractedItem {
            title: title.to_string(),
            content: content.to_string(),
            category: "restaurant".to_string(),
            image_url: Some("https://img/1.jpg".to_string()),
            reason: Some("ok".to_string()),
        }
    }

    fn request(store_id: Option<&str>, group: Option<&str>) -> CollectRequest {
        CollectRequest {
            url: "https://blog.naver.com/a/1".to_string(),
            keyword: None,
            group_name: group.map(str::to_string),
            collection_mode: Some(CollectionMode::Store),
            store_id: store_id.map(str::to_string),
        }
    }

    #[test]
    fn test_rows_carry_normalized_url_and_group_fallback() {
        let rows = build_rows(
            &[item("t", "c")],
            "https://m.blog.naver.com/a/1",
            &request(Some("youngjin"), None),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_url, "https://m.blog.naver.com/a/1");
        // group_name falls back to the store id when no group was supplied
        assert_eq!(rows[0].group_name.as_deref(), Some("youngjin"));
        assert_eq!(rows[0].collection_mode, CollectionMode::Store);
    }

    #[test]
    fn test_explicit_group_wins_over_store_id() {
        let rows = build_rows(&[item("t", "c")], "https://u", &request(Some("s"), Some("g")));
        assert_eq!(rows[0].group_name.as_deref(), Some("g"));
    }

    #[tokio::test]
    async fn test_sync_writes_first_item_summary() {
        let store = Arc::new(RecordingStore::default());
        let gate = Arc::new(SyncGate::new());
        let writer = PersistenceWriter::new(Arc::clone(&store) as Arc<dyn RowStore>, Arc::clone(&gate));

        let snapshot = gate.snapshot("youngjin");
        let items = vec![item("a", "first summary"), item("b", "second summary")];
        let count = writer
            .persist(&items, "https://u", &request(Some("youngjin"), None), Some(snapshot))
            .await
            .unwrap();

        assert_eq!(count, 2);
        let news = store.news.lock().unwrap().clone();
        assert_eq!(news, vec![("youngjin".to_string(), "first summary".to_string())]);
    }

    #[tokio::test]
    async fn test_stale_snapshot_skips_sync_but_inserts() {
        let store = Arc::new(RecordingStore::default());
        let gate = Arc::new(SyncGate::new());
        let writer = PersistenceWriter::new(Arc::clone(&store) as Arc<dyn RowStore>, Arc::clone(&gate));

        let snapshot = gate.snapshot("youngjin");
        gate.bump("youngjin"); // a manual edit landed meanwhile

        writer
            .persist(
                &[item("a", "late crawl")],
                "https://u",
                &request(Some("youngjin"), None),
                Some(snapshot),
            )
            .await
            .unwrap();

        assert_eq!(store.inserted.lock().unwrap().len(), 1);
        assert!(store.news.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_store_id_means_no_sync() {
        let store = Arc::new(RecordingStore::default());
        let writer = PersistenceWriter::new(
            Arc::clone(&store) as Arc<dyn RowStore>,
            Arc::new(SyncGate::new()),
        );

        writer
            .persist(&[item("a", "c")], "https://u", &request(None, Some("g")), None)
            .await
            .unwrap();

        assert!(store.news.lock().unwrap().is_empty());
    }
}
