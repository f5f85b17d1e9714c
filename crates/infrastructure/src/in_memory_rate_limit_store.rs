//! In-memory rate limit store implementation.
//!
//! Process-local and single-instance only: state is neither persisted
//! across restarts nor shared between instances. A multi-instance
//! deployment needs a shared-counter store behind the same port.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postbox_application::{RateLimitRecord, RateLimitStore};
use postbox_core::AppResult;
use tokio::sync::RwLock;

/// In-memory rate limit store.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    records: RwLock<HashMap<String, RateLimitRecord>>,
}

impl InMemoryRateLimitStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn fetch(&self, identifier: &str) -> AppResult<Option<RateLimitRecord>> {
        Ok(self.records.read().await.get(identifier).copied())
    }

    async fn store(&self, identifier: &str, record: RateLimitRecord) -> AppResult<()> {
        self.records
            .write()
            .await
            .insert(identifier.to_owned(), record);
        Ok(())
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| now <= record.reset_at);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use postbox_application::{RateLimitRecord, RateLimitStore};

    use super::InMemoryRateLimitStore;

    #[tokio::test]
    async fn stores_and_fetches_records_per_identifier() {
        let store = InMemoryRateLimitStore::new();
        let record = RateLimitRecord {
            count: 3,
            reset_at: Utc::now() + Duration::seconds(60),
        };

        assert!(store.store("203.0.113.9", record).await.is_ok());

        let fetched = match store.fetch("203.0.113.9").await {
            Ok(fetched) => fetched,
            Err(error) => panic!("fetch failed: {error}"),
        };
        assert_eq!(fetched, Some(record));

        let missing = match store.fetch("198.51.100.7").await {
            Ok(missing) => missing,
            Err(error) => panic!("fetch failed: {error}"),
        };
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn remove_expired_keeps_active_windows() {
        let store = InMemoryRateLimitStore::new();
        let now = Utc::now();

        let expired = RateLimitRecord {
            count: 5,
            reset_at: now - Duration::seconds(1),
        };
        let active = RateLimitRecord {
            count: 1,
            reset_at: now + Duration::seconds(60),
        };
        assert!(store.store("stale", expired).await.is_ok());
        assert!(store.store("fresh", active).await.is_ok());

        let removed = match store.remove_expired(now).await {
            Ok(removed) => removed,
            Err(error) => panic!("remove_expired failed: {error}"),
        };

        assert_eq!(removed, 1);
        assert!(matches!(store.fetch("fresh").await, Ok(Some(_))));
        assert!(matches!(store.fetch("stale").await, Ok(None)));
    }
}
