/// In-memory session store for tests and local development

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::error::AppError;
use crate::session::store::{SessionRecord, SessionStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
    expires_at: Instant,
}

/// Per-entry expiry: every write restarts the clock with the TTL it was given
struct SessionExpiry;

impl Expiry<String, Entry> for SessionExpiry {
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

/// Session store held in process memory
///
/// Entries are serialized like the Redis store. Expired entries are never
/// returned and are evicted by the cache's own maintenance.
#[derive(Clone)]
pub struct InMemorySessionStore {
    cache: Cache<String, Entry>,
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().expire_after(SessionExpiry).build(),
        }
    }

    /// Remaining lifetime of a live session
    pub async fn ttl(&self, user_id: &str) -> Option<Duration> {
        self.cache
            .get(user_id)
            .await
            .map(|entry| entry.expires_at.saturating_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Force a session to expire now, as if its TTL had elapsed
    pub async fn expire(&self, user_id: &str) -> bool {
        self.cache.remove(user_id).await.is_some()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, user_id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), AppError> {
        let entry = Entry {
            value: record.to_json()?,
            ttl,
            expires_at: Instant::now() + ttl,
        };
        self.cache.insert(user_id.to_string(), entry).await;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<SessionRecord>, AppError> {
        match self.cache.get(user_id).await {
            Some(entry) => SessionRecord::from_json(&entry.value).map(Some),
            None => Ok(None),
        }
    }

    async fn delete(&self, user_id: &str) -> Result<(), AppError> {
        self.cache.invalidate(user_id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record() -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: "user".into(),
            verified: true,
            logged_in_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemorySessionStore::new();
        let record = record();
        let key = record.id.to_string();

        store.put(&key, &record, Duration::from_secs(3600)).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(record));

        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
        // deleting an absent session is not an error
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_overwrites_and_refreshes_ttl() {
        let store = InMemorySessionStore::new();
        let first = record();
        let key = first.id.to_string();

        store.put(&key, &first, Duration::from_secs(10)).await.unwrap();
        let mut second = first.clone();
        second.name = "Grace".into();
        store.put(&key, &second, Duration::from_secs(3600)).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap().unwrap().name, "Grace");
        assert!(store.ttl(&key).await.unwrap() > Duration::from_secs(3000));
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let store = InMemorySessionStore::new();
        let record = record();
        let key = record.id.to_string();

        store.put(&key, &record, Duration::from_millis(200)).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(store.ttl(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_unread_expired_sessions_are_evicted() {
        let store = InMemorySessionStore::new();
        for _ in 0..1000 {
            let record = record();
            store
                .put(&record.id.to_string(), &record, Duration::from_millis(50))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        store.cache.run_pending_tasks().await;

        assert_eq!(store.cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_expire_forces_absence() {
        let store = InMemorySessionStore::new();
        let record = record();
        let key = record.id.to_string();

        store.put(&key, &record, Duration::from_secs(3600)).await.unwrap();
        assert!(store.expire(&key).await);
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(!store.expire("missing").await);
    }
}
