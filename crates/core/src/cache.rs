//! Tag-scoped in-memory cache
//!
//! Entries are grouped under a tag namespace. `flush` bumps the tag's
//! epoch counter, which invalidates every entry written under the old
//! epoch in one step instead of scanning keys.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;

struct Entry {
    epoch: u64,
    expires_at: Instant,
    value: serde_json::Value,
}

#[derive(Default)]
struct TagSpace {
    epoch: u64,
    entries: HashMap<String, Entry>,
}

/// Tag-scoped cache with epoch-based bulk invalidation
#[derive(Default)]
pub struct TagCache {
    tags: RwLock<HashMap<String, TagSpace>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if present and unexpired;
    /// otherwise invoke `producer`, cache its result with `ttl`, and
    /// return it.
    ///
    /// The producer runs without a lock held, so a flush that lands
    /// between production and insertion may be overwritten by the
    /// produced value. Mutators flush after writing the store, which
    /// keeps the window to a single request.
    pub async fn remember<T, F, Fut>(
        &self,
        tag: &str,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let tags = self.tags.read().await;
            if let Some(space) = tags.get(tag) {
                if let Some(entry) = space.entries.get(key) {
                    if entry.epoch == space.epoch && entry.expires_at > Instant::now() {
                        return Ok(serde_json::from_value(entry.value.clone())?);
                    }
                }
            }
        }

        let value = producer().await?;
        let raw = serde_json::to_value(&value)?;

        let mut tags = self.tags.write().await;
        let space = tags.entry(tag.to_string()).or_default();
        let epoch = space.epoch;
        space.entries.insert(
            key.to_string(),
            Entry {
                epoch,
                expires_at: Instant::now() + ttl,
                value: raw,
            },
        );
        Ok(value)
    }

    /// Invalidate every entry under `tag`
    pub async fn flush(&self, tag: &str) {
        let mut tags = self.tags.write().await;
        let space = tags.entry(tag.to_string()).or_default();
        space.epoch += 1;
        space.entries.clear();
        debug!(tag, epoch = space.epoch, "flushed cache tag");
    }

    /// Whether `key` currently resolves to a live entry under `tag`
    pub async fn has(&self, tag: &str, key: &str) -> bool {
        let tags = self.tags.read().await;
        tags.get(tag)
            .and_then(|space| {
                space
                    .entries
                    .get(key)
                    .map(|e| e.epoch == space.epoch && e.expires_at > Instant::now())
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_remember_caches_value() {
        let cache = TagCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: u32 = cache
                .remember("tasks", "tasks.1", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.has("tasks", "tasks.1").await);
    }

    #[tokio::test]
    async fn test_flush_forces_recompute() {
        let cache = TagCache::new();
        let calls = AtomicUsize::new(0);
        let producer = || async {
            Ok(calls.fetch_add(1, Ordering::SeqCst))
        };

        let first: usize = cache.remember("tasks", "k", TTL, producer).await.unwrap();
        assert_eq!(first, 0);

        cache.flush("tasks").await;
        assert!(!cache.has("tasks", "k").await);

        let second: usize = cache.remember("tasks", "k", TTL, producer).await.unwrap();
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn test_flush_is_scoped_to_tag() {
        let cache = TagCache::new();

        let _: u32 = cache
            .remember("tasks", "k", TTL, || async { Ok(1) })
            .await
            .unwrap();
        let _: u32 = cache
            .remember("projects", "k", TTL, || async { Ok(2) })
            .await
            .unwrap();

        cache.flush("tasks").await;

        assert!(!cache.has("tasks", "k").await);
        assert!(cache.has("projects", "k").await);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes() {
        let cache = TagCache::new();
        let calls = AtomicUsize::new(0);
        let producer = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("value".to_string())
        };

        let _: String = cache
            .remember("tasks", "k", Duration::ZERO, producer)
            .await
            .unwrap();
        let _: String = cache
            .remember("tasks", "k", Duration::ZERO, producer)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_flushes_are_safe() {
        let cache = std::sync::Arc::new(TagCache::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = std::sync::Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.flush("tasks").await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(!cache.has("tasks", "k").await);
    }
}
