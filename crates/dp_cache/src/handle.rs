use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use dp_core::{CacheStore, Result};

use crate::redis::RedisStore;

/// The injected cache handle every pipeline stage goes through.
///
/// The "store usable" flag is decided once, by the connectivity probe at
/// construction, and never re-checked: a store that dies later degrades every
/// subsequent request to direct generation for the rest of the process.
/// Reads treat store errors as misses so a flaky store can never fail a
/// request; write errors are returned and the caller decides whether they
/// matter.
#[derive(Clone)]
pub struct CacheHandle {
    store: Option<Arc<dyn CacheStore>>,
    usable: bool,
    ttl: Duration,
}

impl CacheHandle {
    /// Wrap an already-probed store. Prefer [`CacheHandle::probe`] unless the
    /// store's reachability is known (in-process stores, tests).
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            usable: true,
            ttl,
        }
    }

    /// Probe `store` once and wrap it. A failed probe keeps the handle
    /// disabled but retains the store for introspection.
    pub async fn probe(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        let usable = match store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "cache store probe failed, caching disabled");
                false
            }
        };
        Self {
            store: Some(store),
            usable,
            ttl,
        }
    }

    /// Connect to a Redis store and probe it. Any failure yields a disabled
    /// handle rather than an error: the service runs uncached.
    pub async fn connect(url: &str, ttl: Duration) -> Self {
        match RedisStore::connect(url).await {
            Ok(store) => Self::probe(Arc::new(store), ttl).await,
            Err(e) => {
                warn!(error = %e, "cache store connection failed, caching disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            usable: false,
            ttl: Duration::ZERO,
        }
    }

    pub fn usable(&self) -> bool {
        self.usable
    }

    /// Read a key. Returns `None` on miss, on store error (logged), and
    /// always when the handle is disabled.
    pub async fn read(&self, key: &str) -> Option<Vec<u8>> {
        if !self.usable {
            return None;
        }
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(value)) => {
                debug!(key, size = value.len(), "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write a key with the configured TTL. Skipped silently when the handle
    /// is disabled; otherwise store errors propagate.
    pub async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        if !self.usable {
            return Ok(());
        }
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        store.set(key, value, self.ttl).await?;
        debug!(key, size = value.len(), "cache write");
        Ok(())
    }
}
