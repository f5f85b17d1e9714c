//! Rate limiting port and application service.
//!
//! Implements a fixed-window counter keyed by client identifier. The
//! algorithm lives entirely in the service; the backing store is an
//! injectable port so a single-instance deployment can use the in-process
//! map while a multi-instance deployment swaps in a shared counter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use postbox_core::AppResult;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Store port mapping identifiers to their current window record.
///
/// The fetch/store round trip is not atomic: two truly simultaneous
/// requests for the same identifier can race on the increment. The worst
/// case is an off-by-one count within one window, which is accepted.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Returns the record for an identifier, if one exists.
    async fn fetch(&self, identifier: &str) -> AppResult<Option<RateLimitRecord>>;

    /// Writes the record for an identifier, replacing any existing one.
    async fn store(&self, identifier: &str, record: RateLimitRecord) -> AppResult<()>;

    /// Removes records whose window has elapsed. Returns how many were
    /// removed.
    async fn remove_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Per-identifier counter state for the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Requests counted in the active window.
    pub count: u32,
    /// When the active window ends.
    pub reset_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the submission rate limit.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    /// Maximum number of requests allowed in one window.
    pub max_requests: u32,
    /// Window duration in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }
}

impl Default for RateLimitRule {
    /// 5 requests per 15 minutes.
    fn default() -> Self {
        Self::new(5, 15 * 60)
    }
}

/// Outcome of a rate limit check. Always a structured result, never an
/// error, so the handler can branch deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the active window.
    pub remaining: u32,
    /// When the active window ends.
    pub reset_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for submission rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn RateLimitStore>,
    rule: RateLimitRule,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, rule: RateLimitRule) -> Self {
        Self { store, rule }
    }

    /// The rule this service enforces.
    #[must_use]
    pub fn rule(&self) -> RateLimitRule {
        self.rule
    }

    /// Counts a request for the identifier and decides whether it may
    /// proceed under the fixed-window rule.
    pub async fn check(&self, identifier: &str) -> AppResult<RateLimitDecision> {
        self.check_at(identifier, Utc::now()).await
    }

    /// Window expiry uses strictly `now > reset_at`: a request arriving
    /// exactly at the boundary is still counted against the old window.
    pub async fn check_at(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitDecision> {
        let existing = self.store.fetch(identifier).await?;

        let active = existing.filter(|record| now <= record.reset_at);

        let Some(record) = active else {
            let record = RateLimitRecord {
                count: 1,
                reset_at: now + Duration::seconds(self.rule.window_seconds),
            };
            self.store.store(identifier, record).await?;

            return Ok(RateLimitDecision {
                allowed: true,
                remaining: self.rule.max_requests.saturating_sub(1),
                reset_at: record.reset_at,
            });
        };

        if record.count >= self.rule.max_requests {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: record.reset_at,
            });
        }

        let updated = RateLimitRecord {
            count: record.count + 1,
            reset_at: record.reset_at,
        };
        self.store.store(identifier, updated).await?;

        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.rule.max_requests.saturating_sub(updated.count),
            reset_at: updated.reset_at,
        })
    }

    /// Removes expired records. Intended for periodic cleanup so the store
    /// does not grow without bound.
    pub async fn sweep(&self) -> AppResult<u64> {
        self.store.remove_expired(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use postbox_core::AppResult;
    use tokio::sync::RwLock;

    use super::{RateLimitDecision, RateLimitRecord, RateLimitRule, RateLimitService, RateLimitStore};

    #[derive(Default)]
    struct MapStore {
        records: RwLock<HashMap<String, RateLimitRecord>>,
    }

    #[async_trait]
    impl RateLimitStore for MapStore {
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

    fn service() -> RateLimitService {
        RateLimitService::new(Arc::new(MapStore::default()), RateLimitRule::new(5, 15 * 60))
    }

    async fn decide(
        service: &RateLimitService,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        match service.check_at(identifier, now).await {
            Ok(decision) => decision,
            Err(error) => panic!("check failed: {error}"),
        }
    }

    #[tokio::test]
    async fn first_request_opens_a_window() {
        let service = service();
        let now = Utc::now();

        let decision = decide(&service, "203.0.113.9", now).await;

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, now + Duration::seconds(15 * 60));
    }

    #[tokio::test]
    async fn sixth_request_in_the_window_is_denied() {
        let service = service();
        let now = Utc::now();

        for expected_remaining in [4, 3, 2, 1, 0] {
            let decision = decide(&service, "203.0.113.9", now).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = decide(&service, "203.0.113.9", now).await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, now + Duration::seconds(15 * 60));
    }

    #[tokio::test]
    async fn window_expiry_resets_the_count() {
        let service = service();
        let now = Utc::now();

        for _ in 0..6 {
            decide(&service, "203.0.113.9", now).await;
        }

        let later = now + Duration::seconds(15 * 60) + Duration::seconds(1);
        let decision = decide(&service, "203.0.113.9", later).await;

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, later + Duration::seconds(15 * 60));
    }

    #[tokio::test]
    async fn request_exactly_at_the_boundary_stays_in_the_old_window() {
        let service = service();
        let now = Utc::now();

        for _ in 0..5 {
            decide(&service, "203.0.113.9", now).await;
        }

        let boundary = now + Duration::seconds(15 * 60);
        let decision = decide(&service, "203.0.113.9", boundary).await;

        assert!(!decision.allowed);
        assert_eq!(decision.reset_at, boundary);
    }

    #[tokio::test]
    async fn identifiers_do_not_interfere() {
        let service = service();
        let now = Utc::now();

        for _ in 0..6 {
            decide(&service, "203.0.113.9", now).await;
        }

        let other = decide(&service, "198.51.100.7", now).await;
        assert!(other.allowed);
        assert_eq!(other.remaining, 4);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let store = Arc::new(MapStore::default());
        let service = RateLimitService::new(store.clone(), RateLimitRule::new(5, 60));
        let now = Utc::now();

        decide(&service, "stale", now - Duration::seconds(120)).await;
        decide(&service, "fresh", now).await;

        let removed = match service.sweep().await {
            Ok(removed) => removed,
            Err(error) => panic!("sweep failed: {error}"),
        };

        assert_eq!(removed, 1);
        assert!(store.records.read().await.contains_key("fresh"));
        assert!(!store.records.read().await.contains_key("stale"));
    }
}
