//! Duplicate guard
//!
//! Runs before any remote spend: the scrape and model calls are the
//! rate-limited, monetarily-costed steps, so an already ingested URL must
//! short-circuit here. Two layers:
//!
//! - an in-process in-flight set keyed by normalized URL, so concurrent
//!   submissions of the same URL cannot both pass the check and both insert
//! - a store lookup matching `source_url` against either URL form
//!
//! The store lookup is best-effort: a failed pre-check query proceeds with
//! a warning rather than failing the pipeline.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::services::RowStore;

/// Outcome of the duplicate pre-check
pub enum GuardDecision {
    /// URL is new; the token keeps it marked in-flight until dropped
    Proceed(InFlightToken),
    /// URL is already ingested or currently being processed
    Skip,
}

/// RAII marker for a URL being processed. Dropping it releases the URL for
/// future submissions, on success and failure paths alike.
pub struct InFlightToken {
    key: String,
    in_flight: Arc<DashMap<String, ()>>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

/// Duplicate pre-check over the persistent content table plus an in-flight
/// set serializing same-URL submissions.
pub struct DuplicateGuard {
    store: Arc<dyn RowStore>,
    in_flight: Arc<DashMap<String, ()>>,
}

impl DuplicateGuard {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Check whether processing may proceed for a URL.
    pub async fn check(&self, original: &str, normalized: &str) -> GuardDecision {
        // Claim the in-flight slot first; the entry guard must not be held
        // across an await
        match self.in_flight.entry(normalized.to_string()) {
            Entry::Occupied(_) => {
                debug!("URL already in flight: {}", normalized);
                return GuardDecision::Skip;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(());
            }
        }
        let token = InFlightToken {
            key: normalized.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        };

        match self
            .store
            .find_content_by_source_url(original, normalized)
            .await
        {
            Ok(Some(id)) => {
                debug!("URL already ingested as row {}: {}", id, normalized);
                GuardDecision::Skip
            }
            Ok(None) => GuardDecision::Proceed(token),
            Err(e) => {
                warn!("Duplicate pre-check failed, proceeding: {}", e);
                GuardDecision::Proceed(token)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StoreError;
    use crate::types::{ContentRecord, StoreRecord};
    use async_trait::async_trait;
    use uuid::Uuid;

    struct FakeStore {
        known_url: Option<String>,
        fail_lookup: bool,
    }

    #[async_trait]
    impl RowStore for FakeStore {
        async fn find_content_by_source_url(
            &self,
            original: &str,
            normalized: &str,
        ) -> Result<Option<Uuid>, StoreError> {
            if self.fail_lookup {
                return Err(StoreError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let hit = self
                .known_url
                .as_deref()
                .map(|known| known == original || known == normalized)
                .unwrap_or(false);
            Ok(hit.then(Uuid::new_v4))
        }

        async fn insert_contents(&self, _rows: &[ContentRecord]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn update_store_news(&self, _id: &str, _info: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn upsert_store(&self, _store: &StoreRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn recent_contents(&self, _limit: usize) -> Result<Vec<ContentRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete_contents(&self, _ids: &[Uuid]) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_new_url_proceeds() {
        let guard = DuplicateGuard::new(Arc::new(FakeStore {
            known_url: None,
            fail_lookup: false,
        }));
        assert!(matches!(
            guard.check("https://a", "https://a").await,
            GuardDecision::Proceed(_)
        ));
    }

    #[tokio::test]
    async fn test_known_url_skips() {
        let guard = DuplicateGuard::new(Arc::new(FakeStore {
            known_url: Some("https://m.blog.naver.com/a/1".to_string()),
            fail_lookup: false,
        }));
        let decision = guard
            .check("https://blog.naver.com/a/1", "https://m.blog.naver.com/a/1")
            .await;
        assert!(matches!(decision, GuardDecision::Skip));
    }

    #[tokio::test]
    async fn test_in_flight_url_skips_until_released() {
        let guard = DuplicateGuard::new(Arc::new(FakeStore {
            known_url: None,
            fail_lookup: false,
        }));

        let first = guard.check("https://a", "https://a").await;
        let token = match first {
            GuardDecision::Proceed(token) => token,
            GuardDecision::Skip => panic!("first submission must proceed"),
        };

        assert!(matches!(
            guard.check("https://a", "https://a").await,
            GuardDecision::Skip
        ));

        drop(token);
        assert!(matches!(
            guard.check("https://a", "https://a").await,
            GuardDecision::Proceed(_)
        ));
    }

    #[tokio::test]
    async fn test_lookup_failure_proceeds() {
        let guard = DuplicateGuard::new(Arc::new(FakeStore {
            known_url: None,
            fail_lookup: true,
        }));
        assert!(matches!(
            guard.check("https://a", "https://a").await,
            GuardDecision::Proceed(_)
        ));
    }
}
