use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use dp_core::{CacheStore, Result};

/// In-process [`CacheStore`] with real TTL expiry. Used by tests and by
/// local runs without a store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_is_byte_identical() {
        let store = MemoryStore::new();
        let payload = b"<rss version=\"2.0\"></rss>".to_vec();
        store
            .set("feed", &payload, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("feed").await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let store = MemoryStore::new();
        store
            .set("feed", b"stale", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.get("feed").await.unwrap(), None);
    }
}
