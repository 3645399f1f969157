//! Batch collection
//!
//! Turns one keyword into candidate URLs via the scrape service's search,
//! then runs each through the pipeline strictly sequentially with a fixed
//! inter-item delay. The delay is a politeness throttle against the scrape
//! and model services, not a performance measure. One URL's failure is
//! recorded and does not stop the rest.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{CollectOutcome, CollectPipeline, CollectRequest};
use crate::config::BatchConfig;
use crate::services::{ScrapeClient, ScrapeError};
use crate::types::CollectionMode;

/// One URL that failed during a batch
#[derive(Debug, Clone, serde::Serialize)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

/// Tallies from one batch run, in input order
#[derive(Debug, Default, serde::Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub empty: usize,
    pub failures: Vec<UrlFailure>,
}

/// Keyword-driven sequential collection
pub struct BatchCollector {
    pipeline: Arc<CollectPipeline>,
    scrape: Arc<dyn ScrapeClient>,
    config: BatchConfig,
}

impl BatchCollector {
    pub fn new(
        pipeline: Arc<CollectPipeline>,
        scrape: Arc<dyn ScrapeClient>,
        config: BatchConfig,
    ) -> Self {
        Self {
            pipeline,
            scrape,
            config,
        }
    }

    /// Build the search query for a keyword and collection mode.
    ///
    /// The configured region tag is forced in when absent, and results are
    /// constrained to the configured blog domains.
    pub fn build_query(&self, keyword: &str, mode: CollectionMode) -> String {
        let keyword = keyword.trim();
        let regional = if !self.config.region.is_empty() && !keyword.contains(&self.config.region) {
            format!("{} {}", self.config.region, keyword)
        } else {
            keyword.to_string()
        };

        let sites = self
            .config
            .blog_domains
            .iter()
            .map(|domain| format!("site:{}", domain))
            .collect::<Vec<_>>()
            .join(" OR ");

        match mode {
            // Targeted store search wants first-hand visit reviews
            CollectionMode::Store => format!("{} review ({})", regional, sites),
            _ => format!("{} recommendations ({})", regional, sites),
        }
    }

    /// Search for candidate URLs, filtered to the configured blog domains
    /// and deduplicated preserving order.
    pub async fn search_urls(
        &self,
        keyword: &str,
        mode: CollectionMode,
    ) -> Result<Vec<String>, ScrapeError> {
        let query = self.build_query(keyword, mode);
        info!("Searching candidate URLs: {}", query);

        let urls = self.scrape.search(&query, self.config.search_limit).await?;

        let mut seen = HashSet::new();
        let filtered: Vec<String> = urls
            .into_iter()
            .filter(|url| {
                self.config
                    .blog_domains
                    .iter()
                    .any(|domain| url.contains(domain.as_str()))
            })
            .filter(|url| seen.insert(url.clone()))
            .collect();

        info!("{} candidate URL(s) after domain filter", filtered.len());
        Ok(filtered)
    }

    /// Search for a keyword's URLs and collect them all.
    pub async fn run(
        &self,
        keyword: &str,
        mode: CollectionMode,
        group_name: Option<String>,
        store_id: Option<String>,
    ) -> Result<BatchReport, ScrapeError> {
        let urls = self.search_urls(keyword, mode).await?;
        Ok(self
            .collect_all(&urls, keyword, mode, group_name, store_id)
            .await)
    }

    /// Collect a list of URLs strictly sequentially with the politeness
    /// delay between items.
    pub async fn collect_all(
        &self,
        urls: &[String],
        keyword: &str,
        mode: CollectionMode,
        group_name: Option<String>,
        store_id: Option<String>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
            }

            let request = CollectRequest {
                url: url.clone(),
                keyword: Some(keyword.to_string()),
                group_name: group_name.clone(),
                collection_mode: Some(mode),
                store_id: store_id.clone(),
            };

            report.attempted += 1;
            match self.pipeline.collect(&request).await {
                Ok(CollectOutcome::Inserted { count, .. }) => report.inserted += count,
                Ok(CollectOutcome::Duplicate) => report.duplicates += 1,
                Ok(CollectOutcome::NoContent) => report.empty += 1,
                Err(e) => {
                    warn!("Collection failed for {}: {}", url, e);
                    report.failures.push(UrlFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch done: {} attempted, {} inserted, {} duplicate(s), {} empty, {} failure(s)",
            report.attempted,
            report.inserted,
            report.duplicates,
            report.empty,
            report.failures.len()
        );
        report
    }
}
