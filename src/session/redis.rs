/// Redis-backed session store

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::configuration::RedisSettings;
use crate::error::{AppError, ConfigError, StoreError};
use crate::session::store::{SessionRecord, SessionStore};

enum Link {
    Connecting,
    Connected(ConnectionManager),
    Closed,
}

/// Session store over a shared Redis instance
///
/// Owns the connection explicitly. `new` only parses the URL; `connect`
/// dials with bounded retries and `connect_in_background` keeps dialing
/// until it succeeds, so the server can start while Redis is still down.
/// Until a link is installed, commands fail with `StoreError::Unavailable`.
/// Once connected, the connection manager reconnects on its own after a
/// dropped link. `close` is final.
pub struct RedisSessionStore {
    client: Client,
    settings: RedisSettings,
    link: RwLock<Link>,
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("url", &mask_redis_url(&self.settings.url))
            .field("key_prefix", &self.settings.key_prefix)
            .finish()
    }
}

impl RedisSessionStore {
    /// Build an unconnected store
    ///
    /// # Errors
    /// `ConfigError` if the URL cannot be parsed
    pub fn new(settings: &RedisSettings) -> Result<Self, AppError> {
        let client = Client::open(settings.url.as_str()).map_err(|e| {
            ConfigError::InvalidValue(format!("redis.url {}: {}", mask_redis_url(&settings.url), e))
        })?;

        Ok(Self {
            client,
            settings: settings.clone(),
            link: RwLock::new(Link::Connecting),
        })
    }

    /// Build a store and connect it before returning
    ///
    /// # Errors
    /// - `ConfigError` if the URL cannot be parsed
    /// - `StoreError::Unavailable` once `max_connect_attempts` are exhausted
    pub async fn open(settings: &RedisSettings) -> Result<Self, AppError> {
        let store = Self::new(settings)?;
        store.connect().await?;
        Ok(store)
    }

    /// Dial Redis, retrying with capped exponential backoff
    ///
    /// # Errors
    /// - `StoreError::Unavailable` once `max_connect_attempts` are exhausted
    /// - `StoreError::Closed` if the store was closed
    pub async fn connect(&self) -> Result<(), AppError> {
        let max_attempts = self.settings.max_connect_attempts.max(1);
        let max_delay = Duration::from_millis(self.settings.retry_max_delay_ms);
        let mut delay = Duration::from_millis(self.settings.retry_base_delay_ms);
        let mut attempt = 0;

        tracing::info!(url = %mask_redis_url(&self.settings.url), "Connecting to session store");

        loop {
            if self.is_closed().await {
                return Err(StoreError::Closed.into());
            }

            attempt += 1;
            match ConnectionManager::new_with_config(self.client.clone(), manager_config(&self.settings)).await {
                Ok(conn) => {
                    let mut link = self.link.write().await;
                    if matches!(*link, Link::Closed) {
                        return Err(StoreError::Closed.into());
                    }
                    *link = Link::Connected(conn);
                    tracing::info!(attempt, "Session store connected");
                    return Ok(());
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Session store connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Session store connection failed");
                    return Err(StoreError::Unavailable(e.to_string()).into());
                }
            }
        }
    }

    /// Keep calling `connect` until it succeeds or the store is closed
    pub fn connect_in_background(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let pause = Duration::from_millis(self.settings.retry_max_delay_ms);

        tokio::spawn(async move {
            loop {
                match store.connect().await {
                    Ok(()) => break,
                    Err(_) if store.is_closed().await => break,
                    Err(e) => {
                        tracing::warn!(
                            retry_in_ms = pause.as_millis() as u64,
                            error = %e,
                            "Session store unreachable, sessions unavailable until it connects"
                        );
                        tokio::time::sleep(pause).await;
                    }
                }
            }
        })
    }

    /// Drop the connection; later operations fail with `StoreError::Closed`
    pub async fn close(&self) {
        let previous = std::mem::replace(&mut *self.link.write().await, Link::Closed);
        if matches!(previous, Link::Connected(_)) {
            tracing::info!("Session store connection closed");
        }
    }

    async fn is_closed(&self) -> bool {
        matches!(*self.link.read().await, Link::Closed)
    }

    async fn connection(&self) -> Result<ConnectionManager, AppError> {
        match &*self.link.read().await {
            Link::Connected(conn) => Ok(conn.clone()),
            Link::Connecting => {
                Err(StoreError::Unavailable("session store not connected yet".to_string()).into())
            }
            Link::Closed => Err(StoreError::Closed.into()),
        }
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}{}", self.settings.key_prefix, user_id)
    }
}

fn manager_config(settings: &RedisSettings) -> ConnectionManagerConfig {
    let timeout = Duration::from_millis(settings.response_timeout_ms);
    ConnectionManagerConfig::new()
        .set_number_of_retries(settings.max_connect_attempts.max(1) as usize)
        .set_exponent_base(2)
        .set_factor(settings.retry_base_delay_ms.max(1))
        .set_max_delay(settings.retry_max_delay_ms)
        .set_connection_timeout(timeout)
        .set_response_timeout(timeout)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, user_id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), AppError> {
        let value = record.to_json()?;
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(self.key(user_id), value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.key(user_id)).await?;
        raw.as_deref().map(SessionRecord::from_json).transpose()
    }

    async fn delete(&self, user_id: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(self.key(user_id)).await?;
        Ok(())
    }
}

/// Mask the password in a Redis URL for safe logging
fn mask_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
