//! In-memory cache implementation using the moka crate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tokio::sync::Mutex;

use stockdesk_core::config::MemoryCacheConfig;
use stockdesk_core::result::AppResult;
use stockdesk_core::traits::cache::CacheProvider;

/// A cached value together with the TTL it was written with.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after its own TTL.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory cache provider using moka.
///
/// Conditional writes (`set_nx`, `compare_and_delete`) are serialized
/// through a single async mutex so they are atomic with respect to each
/// other on this node.
#[derive(Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, Entry>,
    conditional: Arc<Mutex<()>>,
}

impl std::fmt::Debug for MemoryCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheProvider")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            conditional: Arc::new(Mutex::new(())),
        }
    }

    async fn insert(&self, key: &str, value: &str, ttl: Duration) {
        self.cache
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let _guard = self.conditional.lock().await;
        if self.cache.get(key).await.is_some() {
            return Ok(false);
        }
        self.insert(key, value, ttl).await;
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool> {
        let _guard = self.conditional.lock().await;
        match self.cache.get(key).await {
            Some(entry) if entry.value == expected => {
                self.cache.invalidate(key).await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 })
    }

    #[tokio::test]
    async fn test_set_nx_only_first_writer_wins() {
        let provider = make_provider();
        assert!(provider.set_nx("nx", "a", Duration::from_secs(60)).await.unwrap());
        assert!(!provider.set_nx("nx", "b", Duration::from_secs(60)).await.unwrap());
        assert!(!provider.compare_and_delete("nx", "b").await.unwrap());
        assert!(provider.compare_and_delete("nx", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_compare_and_delete_checks_value() {
        let provider = make_provider();
        provider.set_nx("k", "owner-1", Duration::from_secs(60)).await.unwrap();

        assert!(!provider.compare_and_delete("k", "owner-2").await.unwrap());
        assert!(!provider.set_nx("k", "owner-2", Duration::from_secs(60)).await.unwrap());

        assert!(provider.compare_and_delete("k", "owner-1").await.unwrap());
        assert!(provider.set_nx("k", "owner-2", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let provider = make_provider();
        provider.set_nx("short", "v", Duration::from_millis(50)).await.unwrap();
        provider.set_nx("long", "v", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(provider.set_nx("short", "again", Duration::from_secs(60)).await.unwrap());
        assert!(!provider.set_nx("long", "again", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_deleted() {
        let provider = make_provider();
        assert!(!provider.compare_and_delete("missing", "anyone").await.unwrap());
    }
}
