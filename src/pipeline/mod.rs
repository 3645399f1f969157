//! The crawl-normalize-persist pipeline
//!
//! Converts an arbitrary blog URL into deduplicated, model-summarized,
//! image-attached content rows:
//!
//! ```text
//! Normalizer -> Duplicate Guard -> Content Fetcher -> Extraction Stage
//!            -> Structured-Output Parser -> Persistence Writer
//! ```
//!
//! Each stage is one or more sequential awaited round-trips; there is no
//! fan-out within a single URL's run. A stage failure aborts that URL with
//! a typed reason and no automatic retry; batch mode decides whether to
//! keep going with the next URL.

mod batch;
mod extractor;
mod guard;
mod normalizer;
mod parser;
mod sync_gate;
mod writer;

pub use batch::{BatchCollector, BatchReport, UrlFailure};
pub use extractor::{ExtractionError, ExtractionStage};
pub use guard::{DuplicateGuard, GuardDecision, InFlightToken};
pub use normalizer::{normalize, NormalizedUrl};
pub use parser::{extract_json_items, parse_items, ParseError};
pub use sync_gate::SyncGate;
pub use writer::PersistenceWriter;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::services::{GenerativeClient, RowStore, ScrapeClient, ScrapeError, StoreError};
use crate::types::{CollectionMode, ExtractedItem};
use crate::util::truncate_str;

/// One URL-collection request
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub url: String,
    /// Search keyword that produced this URL; steers the extraction prompt
    pub keyword: Option<String>,
    /// Campaign/group label for the resulting rows
    pub group_name: Option<String>,
    pub collection_mode: Option<CollectionMode>,
    /// Target store whose live news should be synchronized
    pub store_id: Option<String>,
}

/// Terminal non-failure outcomes of one URL's run
#[derive(Debug)]
pub enum CollectOutcome {
    /// Rows were written
    Inserted {
        count: usize,
        items: Vec<ExtractedItem>,
    },
    /// URL already ingested (or currently in flight); nothing was spent
    Duplicate,
    /// Fetched content was unusably short, or the model found nothing
    NoContent,
}

/// Terminal failures of one URL's run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] ScrapeError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// The per-URL collection pipeline
pub struct CollectPipeline {
    config: PipelineConfig,
    scrape: Arc<dyn ScrapeClient>,
    guard: DuplicateGuard,
    extraction: ExtractionStage,
    writer: PersistenceWriter,
    sync_gate: Arc<SyncGate>,
}

impl CollectPipeline {
    pub fn new(
        config: PipelineConfig,
        model_candidates: Vec<String>,
        scrape: Arc<dyn ScrapeClient>,
        genai: Arc<dyn GenerativeClient>,
        store: Arc<dyn RowStore>,
        sync_gate: Arc<SyncGate>,
    ) -> Self {
        let extraction = ExtractionStage::new(genai, model_candidates, config.max_input_chars);
        Self {
            guard: DuplicateGuard::new(Arc::clone(&store)),
            writer: PersistenceWriter::new(store, Arc::clone(&sync_gate)),
            config,
            scrape,
            extraction,
            sync_gate,
        }
    }

    /// The gate shared with other writers of store records.
    pub fn sync_gate(&self) -> &Arc<SyncGate> {
        &self.sync_gate
    }

    /// Run one URL through the whole pipeline.
    pub async fn collect(&self, request: &CollectRequest) -> Result<CollectOutcome, PipelineError> {
        let normalized = normalize(&request.url);
        info!("Collecting {}", normalized.target);

        let _token = match self.guard.check(&normalized.original, &normalized.target).await {
            GuardDecision::Skip => {
                info!("Duplicate source URL, skipping: {}", normalized.target);
                return Ok(CollectOutcome::Duplicate);
            }
            GuardDecision::Proceed(token) => token,
        };

        // Snapshot the target store's generation before any remote spend so
        // writes landing during the crawl invalidate our sync
        let sync_snapshot = request
            .store_id
            .as_deref()
            .map(|store_id| self.sync_gate.snapshot(store_id));

        let markdown = self.scrape.scrape_markdown(&normalized.target).await?;
        if markdown.trim().chars().count() < self.config.min_content_len {
            info!(
                "Content below {} chars at {}, nothing to collect",
                self.config.min_content_len, normalized.target
            );
            return Ok(CollectOutcome::NoContent);
        }

        let target_label = request.keyword.as_deref().or(request.store_id.as_deref());
        let raw = self.extraction.run(&markdown, target_label).await?;
        let items = parse_items(&raw)?;

        if items.is_empty() {
            info!("Model extracted nothing from {}", normalized.target);
            return Ok(CollectOutcome::NoContent);
        }

        if let Some(first) = items.first() {
            debug!("Analysis result: {}", truncate_str(&first.content, 60));
            match (&first.image_url, &first.reason) {
                (Some(image), _) => debug!("Image selected: {}", image),
                (None, Some(reason)) => debug!("No image selected: {}", reason),
                (None, None) => debug!("No image selected"),
            }
        }

        let count = self
            .writer
            .persist(&items, &normalized.target, request, sync_snapshot)
            .await?;

        info!("Inserted {} row(s) for {}", count, normalized.target);
        Ok(CollectOutcome::Inserted { count, items })
    }
}
