use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::SecretStore;
use crate::error::Result;

struct CachedSecret {
    value: String,
    expires_at: Instant,
}

/// Read-through TTL cache over a [`SecretStore`].
///
/// Only present values are cached. Writes go to the store first and evict the
/// entry before returning, so a read that follows a write sees the new value.
pub struct SecretCache {
    secrets: Arc<SecretStore>,
    entries: DashMap<String, CachedSecret>,
    ttl: Duration,
    // Bumped on every write while holding the entry's shard lock. A read only
    // inserts under that same lock and only if the generation it started
    // with is still current.
    generation: AtomicU64,
}

impl SecretCache {
    pub fn new(secrets: Arc<SecretStore>, ttl: Duration) -> Self {
        Self {
            secrets,
            entries: DashMap::new(),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, path: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let cached = self
            .entries
            .get(path)
            .map(|entry| (entry.value.clone(), entry.expires_at));

        match cached {
            Some((value, expires_at)) if expires_at > now => {
                tracing::debug!("Secret cache hit for {path}");
                return Ok(Some(value));
            }
            Some(_) => {
                self.entries.remove_if(path, |_, entry| entry.expires_at <= now);
            }
            None => {}
        }

        tracing::debug!("Secret cache miss for {path}");
        let generation = self.generation.load(Ordering::Acquire);
        let value = self.secrets.get(path)?;

        if let Some(value) = &value {
            let entry = self.entries.entry(path.to_string());
            if self.generation.load(Ordering::Acquire) == generation {
                entry.insert(CachedSecret {
                    value: value.clone(),
                    expires_at: Instant::now() + self.ttl,
                });
            }
        }

        Ok(value)
    }

    pub fn set(&self, path: &str, value: &str) -> Result<()> {
        let result = self.secrets.set(path, value);
        self.invalidate(path);
        result
    }

    pub fn delete(&self, path: &str) -> Result<bool> {
        let result = self.secrets.delete(path);
        self.invalidate(path);
        result
    }

    pub fn invalidate(&self, path: &str) {
        let entry = self.entries.entry(path.to_string());
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Entry::Occupied(occupied) = entry {
            occupied.remove();
        }
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Cipher;
    use crate::store::{SqliteStore, Store};
    use tempfile::TempDir;

    fn test_cache(ttl: Duration) -> (TempDir, Arc<dyn Store>, SecretCache) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        let cipher = Arc::new(Cipher::new("master").unwrap());
        let secrets = Arc::new(SecretStore::new(store.clone(), cipher));
        (temp, store, SecretCache::new(secrets, ttl))
    }

    #[test]
    fn test_get_populates_cache() {
        let (_temp, _store, cache) = test_cache(Duration::from_secs(300));
        cache.set("/organizations/o1/x", "v1").unwrap();
        assert!(cache.is_empty());

        assert_eq!(cache.get("/organizations/o1/x").unwrap().as_deref(), Some("v1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_absent_is_not_cached() {
        let (_temp, _store, cache) = test_cache(Duration::from_secs(300));

        assert!(cache.get("/organizations/o1/x").unwrap().is_none());
        assert!(cache.is_empty());

        cache.secrets().set("/organizations/o1/x", "late").unwrap();
        assert_eq!(cache.get("/organizations/o1/x").unwrap().as_deref(), Some("late"));
    }

    #[test]
    fn test_set_evicts_stale_value() {
        let (_temp, _store, cache) = test_cache(Duration::from_secs(300));
        cache.set("/organizations/o1/x", "old").unwrap();
        assert_eq!(cache.get("/organizations/o1/x").unwrap().as_deref(), Some("old"));

        cache.set("/organizations/o1/x", "new").unwrap();
        assert_eq!(cache.get("/organizations/o1/x").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_delete_evicts() {
        let (_temp, _store, cache) = test_cache(Duration::from_secs(300));
        cache.set("/organizations/o1/x", "value").unwrap();
        cache.get("/organizations/o1/x").unwrap();

        assert!(cache.delete("/organizations/o1/x").unwrap());
        assert!(cache.get("/organizations/o1/x").unwrap().is_none());
        assert!(!cache.delete("/organizations/o1/x").unwrap());
    }

    #[test]
    fn test_cached_value_served_until_invalidated() {
        let (_temp, store, cache) = test_cache(Duration::from_secs(300));
        cache.set("/organizations/o1/x", "value").unwrap();
        cache.get("/organizations/o1/x").unwrap();

        // Removed behind the cache's back.
        store.delete_secret("/organizations/o1/x").unwrap();
        assert_eq!(cache.get("/organizations/o1/x").unwrap().as_deref(), Some("value"));

        cache.invalidate("/organizations/o1/x");
        assert!(cache.get("/organizations/o1/x").unwrap().is_none());
    }

    #[test]
    fn test_expired_entry_is_refetched() {
        let (_temp, store, cache) = test_cache(Duration::ZERO);
        cache.set("/organizations/o1/x", "value").unwrap();
        cache.get("/organizations/o1/x").unwrap();

        store.delete_secret("/organizations/o1/x").unwrap();
        assert!(cache.get("/organizations/o1/x").unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_never_see_value_older_than_last_set() {
        use std::sync::atomic::AtomicBool;
        use std::thread;

        let (_temp, _store, cache) = test_cache(Duration::from_secs(300));
        let cache = Arc::new(cache);
        let path = "/organizations/o1/anthropic_api_key";
        cache.set(path, "0").unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let done = done.clone();
                thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        cache.get(path).unwrap();
                    }
                })
            })
            .collect();

        for i in 1..=500 {
            let value = i.to_string();
            cache.set(path, &value).unwrap();
            assert_eq!(cache.get(path).unwrap().as_deref(), Some(value.as_str()));
        }

        done.store(true, Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_clear() {
        let (_temp, _store, cache) = test_cache(Duration::from_secs(300));
        cache.set("/organizations/o1/a", "1").unwrap();
        cache.set("/organizations/o1/b", "2").unwrap();
        cache.get("/organizations/o1/a").unwrap();
        cache.get("/organizations/o1/b").unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
