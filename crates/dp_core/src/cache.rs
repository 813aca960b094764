use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// A durable key-value store with per-key expiry.
///
/// The contract deliberately separates "key absent" from "store unreachable":
/// `get` returns `Ok(None)` on a miss and `Err` when the store itself cannot
/// be reached, so callers can degrade to direct generation instead of failing.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Connectivity probe, run once at startup.
    async fn ping(&self) -> Result<()>;
}
