use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `digests.all`
    Digests,
}

struct Entry<V> {
    value: Option<V>,
    /// Bumped on every invalidation.
    generation: u64,
    /// Generation that was current when `value` was fetched.
    value_generation: u64,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            value: None,
            generation: 0,
            value_generation: 0,
        }
    }
}

impl<V> Entry<V> {
    fn is_fresh(&self) -> bool {
        self.value.is_some() && self.value_generation == self.generation
    }
}

/// Keyed read cache. Invalidation marks an entry stale but keeps its value,
/// so readers see old data until a refetch completes.
pub struct QueryCache<V> {
    entries: RwLock<HashMap<CacheKey, Entry<V>>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store initial data that must still be refetched before it is trusted.
    pub async fn seed(&self, key: CacheKey, value: V) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key).or_default();
        if entry.value.is_none() {
            entry.value = Some(value);
            entry.generation += 1;
        }
    }

    /// Mark `key` stale. The next [`Self::read`] refetches.
    pub async fn invalidate(&self, key: CacheKey) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key).or_default();
        entry.generation += 1;
        log::debug!("Invalidated {:?} (generation {})", key, entry.generation);
    }

    /// Latest known value, stale or not.
    pub async fn peek(&self, key: CacheKey) -> Option<V> {
        self.entries
            .read()
            .await
            .get(&key)
            .and_then(|e| e.value.clone())
    }

    pub async fn is_fresh(&self, key: CacheKey) -> bool {
        self.entries
            .read()
            .await
            .get(&key)
            .is_some_and(|e| e.is_fresh())
    }

    /// Return the cached value if fresh, otherwise run `fetch` and store it.
    ///
    /// A fetch that started before an invalidation is stored but stays stale.
    /// A fetch never replaces a value fetched in a later generation. On error
    /// the entry is left untouched.
    pub async fn read<F, Fut, E>(&self, key: CacheKey, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let started = {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.is_fresh() => {
                    if let Some(value) = &entry.value {
                        return Ok(value.clone());
                    }
                    entry.generation
                }
                Some(entry) => entry.generation,
                None => 0,
            }
        };

        let value = fetch().await?;

        let mut entries = self.entries.write().await;
        let entry = entries.entry(key).or_default();
        if entry.value.is_none() || started >= entry.value_generation {
            entry.value = Some(value.clone());
            entry.value_generation = started;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fresh_value_is_served_without_fetching() {
        let cache = QueryCache::new();
        let counter = AtomicUsize::new(0);
        let fetches = &counter;
        let fetch = move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(vec![1])
        };
        assert_eq!(cache.read(CacheKey::Digests, fetch).await, Ok(vec![1]));
        assert_eq!(cache.read(CacheKey::Digests, fetch).await, Ok(vec![1]));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch_but_keeps_old_value_visible() {
        let cache = QueryCache::new();
        cache
            .read(CacheKey::Digests, || async { Ok::<_, ()>(vec![1]) })
            .await
            .unwrap();
        cache.invalidate(CacheKey::Digests).await;

        assert!(!cache.is_fresh(CacheKey::Digests).await);
        assert_eq!(cache.peek(CacheKey::Digests).await, Some(vec![1]));

        let v = cache
            .read(CacheKey::Digests, || async { Ok::<_, ()>(vec![1, 2]) })
            .await;
        assert_eq!(v, Ok(vec![1, 2]));
        assert!(cache.is_fresh(CacheKey::Digests).await);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_entry_untouched() {
        let cache = QueryCache::new();
        cache.seed(CacheKey::Digests, vec![7]).await;
        let v = cache
            .read(CacheKey::Digests, || async { Err::<Vec<i32>, _>("down") })
            .await;
        assert_eq!(v, Err("down"));
        assert_eq!(cache.peek(CacheKey::Digests).await, Some(vec![7]));
        assert!(!cache.is_fresh(CacheKey::Digests).await);
    }

    #[tokio::test]
    async fn seeded_value_is_stale() {
        let cache = QueryCache::new();
        cache.seed(CacheKey::Digests, vec![1]).await;
        assert!(!cache.is_fresh(CacheKey::Digests).await);
        let v = cache
            .read(CacheKey::Digests, || async { Ok::<_, ()>(vec![2]) })
            .await;
        assert_eq!(v, Ok(vec![2]));
    }

    #[tokio::test]
    async fn fetch_overlapping_an_invalidation_stays_stale() {
        let cache = QueryCache::new();
        let shared = &cache;
        let v = cache
            .read(CacheKey::Digests, move || async move {
                shared.invalidate(CacheKey::Digests).await;
                Ok::<_, ()>(vec![1])
            })
            .await;
        assert_eq!(v, Ok(vec![1]));
        assert_eq!(cache.peek(CacheKey::Digests).await, Some(vec![1]));
        assert!(!cache.is_fresh(CacheKey::Digests).await);
    }
}
