use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct StoredEntry<T> {
    value: T,
    expires_at: Instant,
}

/// In-memory response cache with a per-entry time-to-live.
pub struct ResponseCache<T> {
    store: RwLock<HashMap<String, StoredEntry<T>>>,
    max_entries: usize,
}

impl<T: Clone + Send + Sync + Debug> ResponseCache<T> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Stores a value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put(&self, key: &str, value: T, ttl: Duration) {
        let now = Instant::now();
        let entry = StoredEntry {
            value,
            expires_at: now + ttl,
        };

        let mut store = self.store.write().await;
        if store.len() >= self.max_entries && !store.contains_key(key) {
            store.retain(|_, e| e.expires_at > now);
        }
        if store.len() >= self.max_entries && !store.contains_key(key) {
            let soonest = store
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(evicted) = soonest {
                tracing::debug!(key = %evicted, "Cache full, evicting entry");
                store.remove(&evicted);
            }
        }
        store.insert(key.to_string(), entry);
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get(&self, key: &str) -> Option<T> {
        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if Instant::now() < entry.expires_at => {
                    tracing::debug!("Key found and still fresh");
                    return Some(entry.value.clone());
                }
                Some(_) => tracing::debug!("Key found but expired"),
                None => {
                    tracing::debug!("Key not found");
                    return None;
                }
            }
        }
        self.remove_expired(key).await;
        None
    }

    /// A `put` may land between the read and the write lock, so the expiry
    /// is checked again before removing.
    async fn remove_expired(&self, key: &str) {
        let mut store = self.store.write().await;
        if store
            .get(key)
            .is_some_and(|entry| Instant::now() >= entry.expires_at)
        {
            store.remove(key);
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) {
        self.store.write().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}
