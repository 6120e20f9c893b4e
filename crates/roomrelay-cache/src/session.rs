use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::keys;
use crate::pool::CachePool;

/// An authenticated admin session, keyed by a hash of the bearer token so
/// the raw token is never held at rest in the Cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub username: String,
    pub issued_at: chrono::DateTime<chrono::Utc>,
}

pub async fn put_session(
    cache: &CachePool,
    token_hash: &str,
    session: &AdminSession,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let raw = serde_json::to_string(session)?;
    conn.set_ex::<_, _, ()>(keys::session(token_hash), raw, ttl_secs).await?;
    Ok(())
}

pub async fn get_session(
    cache: &CachePool,
    token_hash: &str,
) -> Result<Option<AdminSession>, CacheError> {
    let mut conn = cache.connection();
    let raw: Option<String> = conn.get(keys::session(token_hash)).await?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub async fn drop_session(cache: &CachePool, token_hash: &str) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let _: () = conn.del(keys::session(token_hash)).await?;
    Ok(())
}
