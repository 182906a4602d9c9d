//! Key/value backends for the authentication stores.

use crate::error::StoreError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Minimal per-key operations the stores rely on.
///
/// Every operation is atomic on the backend, and every written key carries
/// an explicit expiry.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
    async fn del(&self, key: &str) -> Result<(), StoreError>;
}

/// Redis backend over a shared `ConnectionManager`.
///
/// Every round trip is bounded by `op_timeout`; exceeding it surfaces as
/// `StoreError::Timeout` so callers apply their failure policy instead of
/// hanging a request on a slow broker.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisBackend {
    pub fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        // Cloning a ConnectionManager hands out a handle to the same
        // multiplexed connection.
        let mut conn = self.conn.clone();
        let secs = ttl.as_secs().max(1);
        match timeout(self.op_timeout, conn.set_ex::<_, _, ()>(key, value, secs)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        match timeout(self.op_timeout, conn.get::<_, Option<String>>(key)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        match timeout(self.op_timeout, conn.exists::<_, bool>(key)).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        match timeout(self.op_timeout, conn.del::<_, ()>(key)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }
}

/// In-memory backend with real TTL semantics, for tests and local runs.
///
/// `set_available(false)` makes every operation fail with
/// `StoreError::Unavailable`, which is how the chain's fail-open and
/// fail-closed behavior is exercised without a broker.
#[derive(Clone)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
    available: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate backend unavailability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Remaining TTL of a live key, for sliding-window assertions.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .and_then(|(_, expires_at)| expires_at.checked_duration_since(Instant::now()))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "backend marked unavailable".to_string(),
            ))
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }
}
