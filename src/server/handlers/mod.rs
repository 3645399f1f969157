//! HTTP API request handlers

mod collect;
mod contents;
mod stores;
mod system;

use std::sync::Arc;

use crate::pipeline::{BatchCollector, CollectPipeline};
use crate::services::RowStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CollectPipeline>,
    pub batch: Arc<BatchCollector>,
    pub store: Arc<dyn RowStore>,
}

pub use collect::{collect, collect_batch, search};
pub use contents::{delete_contents, list_contents};
pub use stores::upsert_store;
pub use system::health;
