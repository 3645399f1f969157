//! Pipeline and batch collection configuration

use serde::{Deserialize, Serialize};

/// Collection pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum usable fetched-content length (characters). Shorter pages
    /// short-circuit with zero records before any model spend.
    pub min_content_len: usize,
    /// Maximum fetched-content prefix passed to the model (characters)
    pub max_input_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_content_len: 50,
            max_input_chars: 30_000,
        }
    }
}

/// Batch collection behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Fixed delay between URLs in a batch (milliseconds). A politeness
    /// throttle against the scrape and model services, not a scheduler.
    pub delay_ms: u64,
    /// Maximum search results to request per keyword
    pub search_limit: usize,
    /// Region tag forced into search queries when the keyword lacks it.
    /// Empty disables prefixing.
    #[serde(default)]
    pub region: String,
    /// Blog domains searched and accepted; URLs outside these are dropped
    pub blog_domains: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2500,
            search_limit: 40,
            region: String::new(),
            blog_domains: vec!["blog.naver.com".to_string(), "tistory.com".to_string()],
        }
    }
}
