//! Redis connection bootstrap shared by Corebank services.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::Client;
use tracing::info;

/// Redis connection pool handing out cloneable manager handles.
///
/// `ConnectionManager` multiplexes one connection and reconnects
/// transparently; cloning it is cheap and shares the underlying link.
pub struct RedisPool {
    manager: ConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .context("failed to parse REDIS_URL connection string")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connection manager initialized");
        Ok(Self { manager })
    }

    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}
