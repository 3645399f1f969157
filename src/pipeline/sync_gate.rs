//! Store sync gating
//!
//! A store's live-news text has two writers: manual edits and the
//! pipeline's latest-crawl-wins sync. A slow crawl that started before a
//! manual edit must not clobber the fresher text when it finally finishes.
//! Each store carries a generation counter: writers snapshot it up front
//! and may only commit while it is unchanged; every committed write bumps
//! it, invalidating any slower writer still holding an older snapshot.

use dashmap::DashMap;

/// Per-store write-generation counters
#[derive(Default)]
pub struct SyncGate {
    generations: DashMap<String, u64>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation for a store.
    pub fn snapshot(&self, store_id: &str) -> u64 {
        *self.generations.entry(store_id.to_string()).or_insert(0)
    }

    /// Bump the generation unconditionally; used by writers that always
    /// win (manual edits). Returns the new generation.
    pub fn bump(&self, store_id: &str) -> u64 {
        let mut entry = self.generations.entry(store_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Commit a write taken at `snapshot`. Succeeds (and bumps) only if no
    /// other write committed in between.
    pub fn try_commit(&self, store_id: &str, snapshot: u64) -> bool {
        let mut entry = self.generations.entry(store_id.to_string()).or_insert(0);
        if *entry == snapshot {
            *entry += 1;
            true
        } else {
            false
        }
    }
}
