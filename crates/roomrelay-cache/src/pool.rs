use redis::aio::ConnectionManager;
use redis::Client;

use crate::error::CacheError;

/// A cheaply-cloneable handle to the cache/pub-sub connection. `ConnectionManager`
/// multiplexes a single underlying connection and reconnects transparently,
/// so one instance is shared across the whole process rather than pooled
/// per-request the way the Store's connection pool is.
#[derive(Clone)]
pub struct CachePool {
    manager: ConnectionManager,
    client: Client,
}

impl CachePool {
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// A fresh, non-multiplexed connection, for callers that hold it open
    /// for a long-lived subscription (pub/sub `SUBSCRIBE` takes over the
    /// connection's protocol state).
    pub async fn dedicated_connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// A dedicated `SUBSCRIBE`-capable connection. Separate from
    /// `dedicated_connection` because pub/sub puts the connection into a
    /// mode where only (p)subscribe/unsubscribe commands are valid.
    pub async fn pubsub(&self) -> Result<redis::aio::PubSub, CacheError> {
        Ok(self.client.get_async_pubsub().await?)
    }
}

pub async fn create_pool(cache_url: &str) -> Result<CachePool, CacheError> {
    let client = Client::open(cache_url)?;
    let manager = ConnectionManager::new(client.clone()).await?;
    Ok(CachePool { manager, client })
}
