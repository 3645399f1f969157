//! localfeed: content collection daemon for local-business dashboards
//!
//! Converts arbitrary blog URLs into deduplicated, model-summarized,
//! image-attached content records, and keeps store records' live-news text
//! in sync with the latest targeted crawl. Every heavy capability is an
//! external service (scraping, generative extraction, row persistence);
//! this crate owns the pipeline around them:
//! - URL normalization (Markdown unwrapping, desktop-to-mobile rewriting)
//! - duplicate guarding before any paid remote call
//! - candidate-model fallthrough extraction with structured-output parsing
//! - batched, politely-throttled keyword collection
//! - an HTTP API for the dashboard

pub mod config;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
