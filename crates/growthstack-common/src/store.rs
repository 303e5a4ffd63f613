//! Persistent key-value store behind the result cache.
//!
//! The contract is deliberately small, `get`/`set` over strings, and every
//! operation degrades gracefully: a missing or unreachable backend logs a
//! warning and behaves like an empty store, so the application stays fully
//! functional without it. Concurrent writers are not coordinated; the policy
//! is last-writer-wins.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, warn};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` if the key is absent or the store is unavailable.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores a value with no expiry, overwriting any prior entry.
    /// Returns `true` if the write was accepted.
    async fn set(&self, key: &str, value: &str) -> bool;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Option<String> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value).await
    }
}

/// Redis-backed store. The multiplexed connection is established once at
/// startup and cloned per operation; an audit run is short-lived, so a
/// connection lost mid-run reads as misses for the remainder instead of
/// entering a reconnect loop.
pub struct RedisStore {
    conn: Option<MultiplexedConnection>,
}

impl RedisStore {
    /// Connect and verify the backend with a PING. A missing URL, a bad URL,
    /// and an unreachable server all yield a store that always misses and
    /// drops writes.
    pub async fn connect(url: Option<&str>) -> Self {
        let conn = match url {
            Some(url) => match Self::open(url).await {
                Ok(conn) => Some(conn),
                Err(e) => {
                    warn!(error = %e, "audit cache backend unavailable, continuing without it");
                    None
                }
            },
            None => {
                debug!("no cache backend configured, every analysis recomputes");
                None
            }
        };
        Self { conn }
    }

    async fn open(url: &str) -> Result<MultiplexedConnection, redis::RedisError> {
        let mut conn = redis::Client::open(url)?
            .get_multiplexed_async_connection()
            .await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(conn)
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone()?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "audit cache read failed"))
            .ok()?;
        value
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };
        conn.set::<_, _, ()>(key, value)
            .await
            .inspect_err(|e| warn!(error = %e, key, "audit cache write failed"))
            .is_ok()
    }
}
