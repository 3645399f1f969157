//! Integration tests for the collection pipeline
//!
//! These run the full pipeline over in-memory service fakes: a scripted
//! scrape service, a canned generative model, and a Vec-backed row store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use localfeed::config::{BatchConfig, PipelineConfig};
use localfeed::pipeline::{
    BatchCollector, CollectOutcome, CollectPipeline, CollectRequest, SyncGate,
};
use localfeed::services::{
    GenAiError, GenerativeClient, RowStore, ScrapeClient, ScrapeError, StoreError,
};
use localfeed::types::{CollectionMode, ContentRecord, StoreRecord};

/// Scripted scrape service: per-URL markdown plus canned search results.
#[derive(Default)]
struct FakeScrape {
    pages: HashMap<String, String>,
    search_results: Vec<String>,
    scrape_calls: AtomicUsize,
}

#[async_trait]
impl ScrapeClient for FakeScrape {
    async fn scrape_markdown(&self, url: &str) -> Result<String, ScrapeError> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or(ScrapeError::MissingContent)
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>, ScrapeError> {
        Ok(self.search_results.clone())
    }
}

/// Canned generative model: always returns the same text.
struct FakeModel {
    response: String,
    calls: AtomicUsize,
}

impl FakeModel {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerativeClient for FakeModel {
    async fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _json_mode: bool,
    ) -> Result<String, GenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Vec-backed row store.
#[derive(Default)]
struct MemoryStore {
    contents: Mutex<Vec<ContentRecord>>,
    store_news: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn find_content_by_source_url(
        &self,
        original: &str,
        normalized: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let contents = self.contents.lock().unwrap();
        Ok(contents
            .iter()
            .find(|row| row.source_url == original || row.source_url == normalized)
            .map(|row| row.id.unwrap_or_else(Uuid::nil)))
    }

    async fn insert_contents(&self, rows: &[ContentRecord]) -> Result<(), StoreError> {
        let mut contents = self.contents.lock().unwrap();
        for row in rows {
            let mut stored = row.clone();
            stored.id = Some(Uuid::new_v4());
            contents.push(stored);
        }
        Ok(())
    }

    async fn update_store_news(&self, store_id: &str, raw_info: &str) -> Result<(), StoreError> {
        self.store_news
            .lock()
            .unwrap()
            .insert(store_id.to_string(), raw_info.to_string());
        Ok(())
    }

    async fn upsert_store(&self, store: &StoreRecord) -> Result<(), StoreError> {
        self.store_news
            .lock()
            .unwrap()
            .insert(store.store_id.clone(), store.raw_info.clone());
        Ok(())
    }

    async fn recent_contents(&self, limit: usize) -> Result<Vec<ContentRecord>, StoreError> {
        let contents = self.contents.lock().unwrap();
        Ok(contents.iter().rev().take(limit).cloned().collect())
    }

    async fn delete_contents(&self, ids: &[Uuid]) -> Result<usize, StoreError> {
        let mut contents = self.contents.lock().unwrap();
        let before = contents.len();
        contents.retain(|row| row.id.map(|id| !ids.contains(&id)).unwrap_or(true));
        Ok(before - contents.len())
    }
}

const MODEL_OUTPUT: &str = r#"[{"title":"A","content":"B","category":"맛집","image_url":"https://img/1.jpg","reason":"ok"}]"#;

fn pipeline_with(
    scrape: Arc<FakeScrape>,
    model: Arc<FakeModel>,
    store: Arc<MemoryStore>,
) -> Arc<CollectPipeline> {
    Arc::new(CollectPipeline::new(
        PipelineConfig::default(),
        vec!["model-a".to_string(), "model-b".to_string()],
        scrape,
        model,
        store,
        Arc::new(SyncGate::new()),
    ))
}

fn page_of(len: usize) -> String {
    "# post\n".repeat(len / 7 + 1)[..len].to_string()
}

fn request(url: &str, store_id: Option<&str>) -> CollectRequest {
    CollectRequest {
        url: url.to_string(),
        keyword: Some("강릉 맛집".to_string()),
        group_name: None,
        collection_mode: Some(CollectionMode::Net),
        store_id: store_id.map(str::to_string),
    }
}

/// End-to-end: one URL becomes one content row with the chosen image, and
/// the targeted store's live news picks up the first item's summary.
#[tokio::test]
async fn test_end_to_end_collect() {
    let scrape = Arc::new(FakeScrape {
        pages: HashMap::from([(
            "https://m.blog.naver.com/test/999".to_string(),
            page_of(200),
        )]),
        ..Default::default()
    });
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(Arc::clone(&scrape), Arc::clone(&model), Arc::clone(&store));

    let outcome = pipeline
        .collect(&request("https://blog.naver.com/test/999", Some("youngjin")))
        .await
        .unwrap();

    match outcome {
        CollectOutcome::Inserted { count, items } => {
            assert_eq!(count, 1);
            assert_eq!(items[0].title, "A");
        }
        other => panic!("expected insert, got {:?}", other),
    }

    let rows = store.contents.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_url, "https://m.blog.naver.com/test/999");
    assert_eq!(rows[0].image_url.as_deref(), Some("https://img/1.jpg"));
    assert_eq!(rows[0].category, "맛집");
    // No explicit group: rows fall back to the target store id
    assert_eq!(rows[0].group_name.as_deref(), Some("youngjin"));

    let news = store.store_news.lock().unwrap().clone();
    assert_eq!(news.get("youngjin").map(String::as_str), Some("B"));
}

/// Submitting the same URL twice yields exactly one row; the second run is
/// a duplicate skip that spends nothing on scrape or model calls.
#[tokio::test]
async fn test_duplicate_guard_is_idempotent() {
    let scrape = Arc::new(FakeScrape {
        pages: HashMap::from([(
            "https://m.blog.naver.com/test/999".to_string(),
            page_of(200),
        )]),
        ..Default::default()
    });
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(Arc::clone(&scrape), Arc::clone(&model), Arc::clone(&store));

    let first = pipeline
        .collect(&request("https://blog.naver.com/test/999", None))
        .await
        .unwrap();
    assert!(matches!(first, CollectOutcome::Inserted { count: 1, .. }));

    let scrapes_after_first = scrape.scrape_calls.load(Ordering::SeqCst);
    let model_calls_after_first = model.calls.load(Ordering::SeqCst);

    let second = pipeline
        .collect(&request("https://blog.naver.com/test/999", None))
        .await
        .unwrap();
    assert!(matches!(second, CollectOutcome::Duplicate));

    assert_eq!(store.contents.lock().unwrap().len(), 1);
    assert_eq!(scrape.scrape_calls.load(Ordering::SeqCst), scrapes_after_first);
    assert_eq!(model.calls.load(Ordering::SeqCst), model_calls_after_first);
}

/// The desktop form of an already ingested mobile URL is also a duplicate.
#[tokio::test]
async fn test_duplicate_guard_matches_either_url_form() {
    let scrape = Arc::new(FakeScrape {
        pages: HashMap::from([(
            "https://m.blog.naver.com/test/999".to_string(),
            page_of(200),
        )]),
        ..Default::default()
    });
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(scrape, model, Arc::clone(&store));

    pipeline
        .collect(&request("https://blog.naver.com/test/999", None))
        .await
        .unwrap();

    let second = pipeline
        .collect(&request(
            "https://blog.naver.com/?blogId=test&logNo=999",
            None,
        ))
        .await
        .unwrap();
    assert!(matches!(second, CollectOutcome::Duplicate));
    assert_eq!(store.contents.lock().unwrap().len(), 1);
}

/// Content under the minimum length short-circuits before any model spend.
#[tokio::test]
async fn test_short_content_skips_extraction() {
    let scrape = Arc::new(FakeScrape {
        pages: HashMap::from([(
            "https://m.blog.naver.com/test/1".to_string(),
            "too short".to_string(),
        )]),
        ..Default::default()
    });
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(scrape, Arc::clone(&model), Arc::clone(&store));

    let outcome = pipeline
        .collect(&request("https://blog.naver.com/test/1", None))
        .await
        .unwrap();

    assert!(matches!(outcome, CollectOutcome::NoContent));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert!(store.contents.lock().unwrap().is_empty());
}

/// A scrape failure is a hard fetch error, not a silent empty result.
#[tokio::test]
async fn test_fetch_failure_is_hard_error() {
    let scrape = Arc::new(FakeScrape::default());
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(scrape, model, store);

    let err = pipeline
        .collect(&request("https://blog.naver.com/test/404", None))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("fetch failed"));
}

/// Batch mode: URLs run in order, per-item failures are collected without
/// stopping the loop, and already ingested URLs count as duplicates.
#[tokio::test]
async fn test_batch_collects_sequentially_and_survives_failures() {
    let scrape = Arc::new(FakeScrape {
        pages: HashMap::from([
            ("https://m.blog.naver.com/a/1".to_string(), page_of(200)),
            // b/2 missing: scrape fails for it
            ("https://m.blog.naver.com/c/3".to_string(), page_of(200)),
        ]),
        search_results: vec![
            "https://blog.naver.com/a/1".to_string(),
            "https://news.example.com/off-domain".to_string(),
            "https://blog.naver.com/b/2".to_string(),
            "https://blog.naver.com/c/3".to_string(),
            "https://blog.naver.com/a/1".to_string(), // repeat
        ],
        ..Default::default()
    });
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline_with(Arc::clone(&scrape), model, Arc::clone(&store));

    let batch = BatchCollector::new(
        pipeline,
        scrape,
        BatchConfig {
            delay_ms: 0,
            ..Default::default()
        },
    );

    let report = batch
        .run("맛집", CollectionMode::Net, None, None)
        .await
        .unwrap();

    // Off-domain and repeated URLs never reach the pipeline
    assert_eq!(report.attempted, 3);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].url.contains("/b/2"));

    // Rows accumulate in submission order
    let rows = store.contents.lock().unwrap().clone();
    let sources: Vec<&str> = rows.iter().map(|row| row.source_url.as_str()).collect();
    assert_eq!(
        sources,
        vec!["https://m.blog.naver.com/a/1", "https://m.blog.naver.com/c/3"]
    );
}

/// A store record written between collect start and finish wins over the
/// crawl's sync; the crawled rows still insert.
#[tokio::test]
async fn test_manual_edit_beats_slow_crawl_sync() {
    let scrape = Arc::new(FakeScrape {
        pages: HashMap::from([(
            "https://m.blog.naver.com/test/999".to_string(),
            page_of(200),
        )]),
        ..Default::default()
    });
    let model = Arc::new(FakeModel::new(MODEL_OUTPUT));
    let store = Arc::new(MemoryStore::default());
    let sync_gate = Arc::new(SyncGate::new());

    let pipeline = CollectPipeline::new(
        PipelineConfig::default(),
        vec!["model-a".to_string()],
        scrape,
        model,
        Arc::clone(&store) as Arc<dyn RowStore>,
        Arc::clone(&sync_gate),
    );

    // Simulate the dashboard edit landing while the crawl runs: the gate
    // snapshot happens inside collect before the fetch, so bump first to
    // model an edit that raced ahead of this crawl's completion.
    sync_gate.bump("youngjin");
    store
        .update_store_news("youngjin", "fresh manual text")
        .await
        .unwrap();

    // The crawl snapshot now sees the post-edit generation, so its sync is
    // allowed; run a second edit-and-crawl round where the edit lands after
    // the snapshot by driving the writer's snapshot manually.
    let stale_snapshot = sync_gate.snapshot("youngjin");
    sync_gate.bump("youngjin");
    assert!(!sync_gate.try_commit("youngjin", stale_snapshot));

    // And a normal collect still syncs when nothing intervened.
    let outcome = pipeline
        .collect(&request("https://blog.naver.com/test/999", Some("youngjin")))
        .await
        .unwrap();
    assert!(matches!(outcome, CollectOutcome::Inserted { .. }));
    let news = store.store_news.lock().unwrap().clone();
    assert_eq!(news.get("youngjin").map(String::as_str), Some("B"));
}
