//! External service client configuration

use serde::{Deserialize, Serialize};

/// Configuration for all external service clients
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicesConfig {
    /// Scraping service (page text and keyword search)
    #[serde(default)]
    pub scrape: ScrapeServiceConfig,
    /// Generative-model service (extraction/summarization)
    #[serde(default)]
    pub genai: GenAiConfig,
    /// Row store (content and store records)
    #[serde(default)]
    pub store: StoreServiceConfig,
}

/// Scraping service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeServiceConfig {
    /// API base endpoint
    pub endpoint: String,
    /// API key; falls back to the FIRECRAWL_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ScrapeServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.firecrawl.dev/v2".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Generative-model service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    /// API base endpoint
    pub endpoint: String,
    /// API key; falls back to the GEMINI_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    /// Candidate model names, most to least capable. The extraction stage
    /// tries them in order and stops at the first non-empty response.
    pub model_candidates: Vec<String>,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model_candidates: vec![
                "gemini-2.0-flash-exp".to_string(),
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-flash-latest".to_string(),
            ],
            timeout_secs: 60,
        }
    }
}

/// Row store configuration (PostgREST-style endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreServiceConfig {
    /// Project base endpoint (the client appends /rest/v1)
    pub endpoint: String,
    /// API key; falls back to the SUPABASE_ANON_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    /// Table holding content records
    pub content_table: String,
    /// Table holding store records
    pub store_table: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for StoreServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:54321".to_string(),
            api_key: None,
            content_table: "contents".to_string(),
            store_table: "stores".to_string(),
            timeout_secs: 30,
        }
    }
}
