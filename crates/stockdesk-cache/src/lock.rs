//! Best-effort distributed lease built on the cache provider.
//!
//! A lease is a key whose value is a random holder token and whose TTL
//! bounds how long a crashed holder can block others. Acquisition never
//! waits: losing the race returns `None`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use stockdesk_core::result::AppResult;
use stockdesk_core::traits::cache::CacheProvider;

use crate::keys;

/// Issues leases against a cache provider.
#[derive(Debug, Clone)]
pub struct LeaseLock {
    cache: Arc<dyn CacheProvider>,
}

impl LeaseLock {
    /// Create a lease lock backed by `cache`.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Try to take the named lease for `ttl`.
    pub async fn try_acquire(&self, name: &str, ttl: Duration) -> AppResult<Option<Lease>> {
        let key = keys::lease(name);
        let token = Uuid::new_v4().to_string();

        if self.cache.set_nx(&key, &token, ttl).await? {
            debug!(lease = name, ttl_secs = ttl.as_secs(), "Lease acquired");
            Ok(Some(Lease {
                name: name.to_string(),
                key,
                token,
                cache: Arc::clone(&self.cache),
            }))
        } else {
            debug!(lease = name, "Lease held elsewhere");
            Ok(None)
        }
    }
}

/// A held lease. Dropping it without [`Lease::release`] leaves the key to expire.
#[derive(Debug)]
pub struct Lease {
    name: String,
    key: String,
    token: String,
    cache: Arc<dyn CacheProvider>,
}

impl Lease {
    /// Lease name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release the lease if this holder still owns it.
    ///
    /// Returns `false` when the lease had already expired (and may now
    /// belong to someone else, whose lease is left untouched).
    pub async fn release(self) -> AppResult<bool> {
        let released = self.cache.compare_and_delete(&self.key, &self.token).await?;
        if !released {
            warn!(lease = %self.name, "Lease expired before release");
        }
        Ok(released)
    }
}
