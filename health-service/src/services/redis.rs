//! Redis collaborator for the cache probe.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Key/value store with per-key expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error>;
    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
}

/// Redis-backed cache. The multiplexed connection is opened on first use and
/// shared by later commands; any command error drops it so the next call
/// reconnects. The service can therefore start (and report `disconnected`)
/// while Redis is down, and recovers as soon as it comes back.
#[derive(Clone)]
pub struct RedisService {
    client: Client,
    conn: Arc<AsyncMutex<Option<MultiplexedConnection>>>,
}

impl RedisService {
    pub fn new(config: &crate::config::RedisConfig) -> Result<Self, redis::RedisError> {
        use secrecy::ExposeSecret;

        let client = Client::open(config.url.expose_secret().as_str())?;
        tracing::info!("Redis client configured");

        Ok(Self {
            client,
            conn: Arc::new(AsyncMutex::new(None)),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Failed to open Redis connection");
                e
            })?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        self.conn.lock().await.take();
    }

    async fn query<T: redis::FromRedisValue>(
        &self,
        cmd: &redis::Cmd,
    ) -> Result<T, redis::RedisError> {
        let mut conn = self.connection().await?;
        match cmd.query_async(&mut conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.reset().await;
                Err(e)
            }
        }
    }

    #[cfg(test)]
    async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

#[async_trait]
impl CacheStore for RedisService {
    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(expiry_seconds);
        let _: () = self.query(&cmd).await?;
        Ok(())
    }

    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let value: Option<String> = self.query(redis::cmd("GET").arg(key)).await?;
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedValue {
    pub value: String,
    pub expiry_seconds: u64,
}

enum MockMode {
    Working,
    Failing(String),
    /// Reads return this value regardless of what was written.
    Stale(Option<String>),
}

/// In-memory cache for tests.
pub struct MockCache {
    mode: MockMode,
    pub entries: Mutex<HashMap<String, CachedValue>>,
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCache {
    pub fn new() -> Self {
        Self::with_mode(MockMode::Working)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(MockMode::Failing(message.into()))
    }

    pub fn stale(observed: Option<&str>) -> Self {
        Self::with_mode(MockMode::Stale(observed.map(str::to_string)))
    }

    fn with_mode(mode: MockMode) -> Self {
        Self {
            mode,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn entry(&self, key: &str) -> Option<CachedValue> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl CacheStore for MockCache {
    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error> {
        if let MockMode::Failing(message) = &self.mode {
            return Err(anyhow::anyhow!("{}", message));
        }
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .insert(
                key.to_string(),
                CachedValue {
                    value: value.to_string(),
                    expiry_seconds,
                },
            );
        Ok(())
    }

    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        match &self.mode {
            MockMode::Failing(message) => Err(anyhow::anyhow!("{}", message)),
            MockMode::Stale(observed) => Ok(observed.clone()),
            MockMode::Working => {
                let val = self
                    .entries
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
                    .get(key)
                    .map(|entry| entry.value.clone());
                Ok(val)
            }
        }
    }
}
