//! Clients for the external services the pipeline delegates to.
//!
//! Every non-trivial capability here is a remote API: page scraping and
//! keyword search, generative-model extraction, and row persistence. Each
//! client is an object-safe trait with one HTTP implementation, so the
//! pipeline and its tests can swap in-memory fakes at the same seam.

mod genai;
mod scrape;
mod store;

pub use genai::{GenAiError, GenerativeClient, HttpGenerativeClient};
pub use scrape::{HttpScrapeClient, ScrapeClient, ScrapeError};
pub use store::{HttpRowStore, RowStore, StoreError};

use std::sync::Arc;

use crate::config::ServicesConfig;

/// Construct the HTTP-backed service clients from configuration.
pub fn build_clients(
    config: &ServicesConfig,
) -> anyhow::Result<(Arc<dyn ScrapeClient>, Arc<dyn GenerativeClient>, Arc<dyn RowStore>)> {
    let scrape = HttpScrapeClient::new(&config.scrape)?;
    let genai = HttpGenerativeClient::new(&config.genai)?;
    let store = HttpRowStore::new(&config.store)?;
    Ok((Arc::new(scrape), Arc::new(genai), Arc::new(store)))
}
