use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::error::StoreError;
use crate::models::Profile;
use crate::services::store::ProfileStore;

/// Read-through profile cache in front of another `ProfileStore`
///
/// Only single-profile lookups are cached; candidate listings always go to
/// the underlying store so opt-outs are seen immediately.
pub struct CachedProfileStore {
    inner: Arc<dyn ProfileStore>,
    cache: moka::future::Cache<String, Profile>,
    /// Bumped on every write; a load that overlaps a write is not kept
    writes: AtomicU64,
}

impl CachedProfileStore {
    pub fn new(inner: Arc<dyn ProfileStore>, capacity: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            inner,
            cache,
            writes: AtomicU64::new(0),
        }
    }

    /// Drop the cached copy after a write to the underlying store
    async fn invalidate(&self, user_id: &str) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(&CacheKey::profile(user_id)).await;
    }
}

#[async_trait]
impl ProfileStore for CachedProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let key = CacheKey::profile(user_id);
        if let Some(profile) = self.cache.get(&key).await {
            tracing::trace!("Cache hit: {}", key);
            return Ok(Some(profile));
        }

        tracing::trace!("Cache miss: {}", key);
        let seen = self.writes.load(Ordering::SeqCst);
        let profile = self.inner.get(user_id).await?;
        if let Some(profile) = &profile {
            if self.writes.load(Ordering::SeqCst) == seen {
                self.cache.insert(key.clone(), profile.clone()).await;
                // A write that landed during the insert may have missed it
                if self.writes.load(Ordering::SeqCst) != seen {
                    self.cache.invalidate(&key).await;
                }
            }
        }
        Ok(profile)
    }

    async fn list_opted_in(&self) -> Result<Vec<(String, Profile)>, StoreError> {
        self.inner.list_opted_in().await
    }

    async fn upsert(&self, user_id: &str, profile: &Profile) -> Result<(), StoreError> {
        self.inner.upsert(user_id, profile).await?;
        self.invalidate(user_id).await;
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
        let existed = self.inner.delete(user_id).await?;
        self.invalidate(user_id).await;
        Ok(existed)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user profile
    pub fn profile(user_id: &str) -> String {
        format!("profile:{}", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryProfileStore;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    /// Store whose next `get` reads, then waits to be released before returning
    #[derive(Default)]
    struct HeldStore {
        inner: MemoryProfileStore,
        hold_next: AtomicBool,
        loaded: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ProfileStore for HeldStore {
        async fn get(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
            let profile = self.inner.get(user_id).await?;
            if self.hold_next.swap(false, Ordering::SeqCst) {
                self.loaded.notify_one();
                self.release.notified().await;
            }
            Ok(profile)
        }

        async fn list_opted_in(&self) -> Result<Vec<(String, Profile)>, StoreError> {
            self.inner.list_opted_in().await
        }

        async fn upsert(&self, user_id: &str, profile: &Profile) -> Result<(), StoreError> {
            self.inner.upsert(user_id, profile).await
        }

        async fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
            self.inner.delete(user_id).await
        }

        async fn health_check(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::profile("user123"), "profile:user123");
    }

    #[tokio::test]
    async fn test_writes_invalidate() {
        let inner = Arc::new(MemoryProfileStore::new());
        let cached = CachedProfileStore::new(inner.clone(), 100, 60);

        cached.upsert("1", &Profile::default()).await.unwrap();
        assert!(cached.get("1").await.unwrap().unwrap().major.is_none());

        let mut updated = Profile::default();
        updated.major = Some("Physics".to_string());
        cached.upsert("1", &updated).await.unwrap();
        assert_eq!(cached.get("1").await.unwrap().unwrap().major.as_deref(), Some("Physics"));

        assert!(cached.delete("1").await.unwrap());
        assert!(cached.get("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_serves_from_cache() {
        let inner = Arc::new(MemoryProfileStore::new());
        let cached = CachedProfileStore::new(inner.clone(), 100, 60);

        inner.upsert("1", &Profile::default()).await.unwrap();
        assert!(cached.get("1").await.unwrap().is_some());

        // Bypass the cache: the stale copy is still served until invalidated
        inner.delete("1").await.unwrap();
        assert!(cached.get("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_overlapping_write_is_not_cached() {
        let inner = Arc::new(HeldStore::default());
        let cached = Arc::new(CachedProfileStore::new(inner.clone(), 100, 60));
        cached.upsert("1", &Profile::default()).await.unwrap();

        inner.hold_next.store(true, Ordering::SeqCst);
        let reader = {
            let cached = cached.clone();
            tokio::spawn(async move { cached.get("1").await })
        };
        inner.loaded.notified().await;

        let updated = Profile {
            major: Some("Physics".to_string()),
            ..Default::default()
        };
        cached.upsert("1", &updated).await.unwrap();
        inner.release.notify_one();

        // The overlapping read still answers with what it loaded
        let stale = reader.await.unwrap().unwrap().unwrap();
        assert!(stale.major.is_none());

        assert_eq!(cached.get("1").await.unwrap().unwrap().major.as_deref(), Some("Physics"));
    }
}
