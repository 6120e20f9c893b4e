use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CacheError;
use crate::keys;
use crate::pool::CachePool;

async fn get_json<T: DeserializeOwned>(
    cache: &CachePool,
    key: &str,
) -> Result<Option<T>, CacheError> {
    let mut conn = cache.connection();
    let raw: Option<String> = conn.get(key).await?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

async fn set_json<T: Serialize>(
    cache: &CachePool,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let raw = serde_json::to_string(value)?;
    conn.set_ex::<_, _, ()>(key, raw, ttl_secs).await?;
    Ok(())
}

pub async fn get_room(
    cache: &CachePool,
    room_id: i64,
) -> Result<Option<roomrelay_models::room::Room>, CacheError> {
    get_json(cache, &keys::room(room_id)).await
}

pub async fn put_room(
    cache: &CachePool,
    room: &roomrelay_models::room::Room,
) -> Result<(), CacheError> {
    set_json(cache, &keys::room(room.id), room, keys::ROOM_TTL_SECS).await
}

pub async fn drop_room(cache: &CachePool, room_id: i64) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let _: () = conn.del(keys::room(room_id)).await?;
    Ok(())
}

pub async fn get_perms(
    cache: &CachePool,
    room_id: i64,
) -> Result<Option<roomrelay_models::permissions::RoomPermissions>, CacheError> {
    get_json(cache, &keys::perms(room_id)).await
}

pub async fn put_perms(
    cache: &CachePool,
    perms: &roomrelay_models::permissions::RoomPermissions,
) -> Result<(), CacheError> {
    set_json(cache, &keys::perms(perms.room_id), perms, keys::PERMS_TTL_SECS).await
}

pub async fn drop_perms(cache: &CachePool, room_id: i64) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let _: () = conn.del(keys::perms(room_id)).await?;
    Ok(())
}

/// Resolution of a `chan:` lookup: a live binding, a negative-cache
/// tombstone, or nothing cached yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChanLookup {
    Room(i64),
    Tombstone,
}

pub async fn get_chan(
    cache: &CachePool,
    guild_id: i64,
    channel_id: i64,
) -> Result<Option<ChanLookup>, CacheError> {
    let mut conn = cache.connection();
    let raw: Option<String> = conn.get(keys::chan(guild_id, channel_id)).await?;
    Ok(raw.map(|v| {
        if v == keys::TOMBSTONE {
            ChanLookup::Tombstone
        } else {
            ChanLookup::Room(v.parse().unwrap_or_default())
        }
    }))
}

pub async fn put_chan_room(
    cache: &CachePool,
    guild_id: i64,
    channel_id: i64,
    room_id: i64,
) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    conn.set_ex::<_, _, ()>(
        keys::chan(guild_id, channel_id),
        room_id.to_string(),
        keys::CHAN_TTL_SECS,
    )
    .await?;
    Ok(())
}

pub async fn put_chan_tombstone(
    cache: &CachePool,
    guild_id: i64,
    channel_id: i64,
) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    conn.set_ex::<_, _, ()>(
        keys::chan(guild_id, channel_id),
        keys::TOMBSTONE,
        keys::TOMBSTONE_TTL_SECS,
    )
    .await?;
    Ok(())
}

pub async fn drop_chan(cache: &CachePool, guild_id: i64, channel_id: i64) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let _: () = conn.del(keys::chan(guild_id, channel_id)).await?;
    Ok(())
}

/// The `live_stats` snapshot the Live Push Hub ticks every few seconds and
/// `GET /analytics/live` reads back without needing its own websocket
/// connection count.
pub async fn get_live_stats(
    cache: &CachePool,
) -> Result<Option<roomrelay_models::live_push::LiveStats>, CacheError> {
    get_json(cache, keys::LIVE_STATS_KEY).await
}

pub async fn put_live_stats(
    cache: &CachePool,
    stats: &roomrelay_models::live_push::LiveStats,
) -> Result<(), CacheError> {
    set_json(cache, keys::LIVE_STATS_KEY, stats, keys::LIVE_STATS_TTL_SECS).await
}
