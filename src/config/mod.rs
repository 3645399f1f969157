//! Configuration for localfeed

mod logging;
mod pipeline;
mod server;
mod services;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use pipeline::{BatchConfig, PipelineConfig};
pub use server::HttpConfig;
pub use services::{GenAiConfig, ScrapeServiceConfig, ServicesConfig, StoreServiceConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the localfeed service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// External service clients (scrape, generative model, row store)
    #[serde(default)]
    pub services: ServicesConfig,
    /// Collection pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Batch collection behavior
    #[serde(default)]
    pub batch: BatchConfig,
    /// HTTP API server configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.services.scrape.endpoint.is_empty() {
            errors.push("services.scrape.endpoint must not be empty".to_string());
        }
        if self.services.genai.endpoint.is_empty() {
            errors.push("services.genai.endpoint must not be empty".to_string());
        }
        if self.services.genai.model_candidates.is_empty() {
            errors.push("services.genai.model_candidates must list at least one model".to_string());
        }
        if self.services.store.endpoint.is_empty() {
            errors.push("services.store.endpoint must not be empty".to_string());
        }
        if self.services.store.content_table.is_empty() {
            errors.push("services.store.content_table must not be empty".to_string());
        }
        if self.services.store.store_table.is_empty() {
            errors.push("services.store.store_table must not be empty".to_string());
        }

        if self.pipeline.min_content_len == 0 {
            errors.push("pipeline.min_content_len must be positive".to_string());
        }
        if self.pipeline.max_input_chars < self.pipeline.min_content_len {
            errors.push("pipeline.max_input_chars must be >= min_content_len".to_string());
        }

        if self.batch.search_limit == 0 {
            errors.push("batch.search_limit must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Invalid configuration:\n  - {}", errors.join("\n  - ")))
        }
    }
}
