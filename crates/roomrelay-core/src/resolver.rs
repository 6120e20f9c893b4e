use roomrelay_cache::snapshot::{self, ChanLookup};
use roomrelay_cache::CachePool;
use roomrelay_models::permissions::RoomPermissions;
use roomrelay_models::room::Room;
use roomrelay_store::DbPool;

use crate::error::PolicyRejection;

/// Maps an inbound `(guild_id, channel_id)` to its room and permission
/// snapshot, enforcing the ban/subscription/active checks along the way.
/// Cache-first with a Store fallback that repopulates the Cache on miss.
///
/// The spec's TTL table has no cache entry for bans, so the ban check below
/// goes straight to Store rather than inventing an uncalled-for cache key;
/// the bans table is small and read-through here costs one indexed lookup.
pub async fn resolve(
    store: &DbPool,
    cache: &CachePool,
    guild_id: i64,
    channel_id: i64,
) -> Result<(Room, RoomPermissions), PolicyRejection> {
    let room_id = resolve_room_id(store, cache, guild_id, channel_id).await?;

    let room = match snapshot::get_room(cache, room_id).await.ok().flatten() {
        Some(room) => room,
        None => {
            let room = roomrelay_store::rooms::get_room(store, room_id)
                .await
                .map_err(PolicyRejection::from)?
                .ok_or(PolicyRejection::NotSubscribed)?;
            let _ = snapshot::put_room(cache, &room).await;
            room
        }
    };
    if !room.is_active {
        return Err(PolicyRejection::RoomInactive);
    }

    let permissions = match snapshot::get_perms(cache, room_id).await.ok().flatten() {
        Some(perms) => perms,
        None => {
            let perms = roomrelay_store::permissions::get_permissions(store, room_id)
                .await
                .map_err(PolicyRejection::from)?
                .ok_or(PolicyRejection::NotSubscribed)?;
            let _ = snapshot::put_perms(cache, &perms).await;
            perms
        }
    };

    if roomrelay_store::bans::is_guild_banned(store, guild_id)
        .await
        .map_err(PolicyRejection::from)?
    {
        return Err(PolicyRejection::GuildBanned);
    }

    Ok((room, permissions))
}

async fn resolve_room_id(
    store: &DbPool,
    cache: &CachePool,
    guild_id: i64,
    channel_id: i64,
) -> Result<i64, PolicyRejection> {
    if let Some(hit) = snapshot::get_chan(cache, guild_id, channel_id).await.ok().flatten() {
        return match hit {
            ChanLookup::Room(room_id) => Ok(room_id),
            ChanLookup::Tombstone => Err(PolicyRejection::NotSubscribed),
        };
    }

    match roomrelay_store::subscriptions::find_by_channel(store, guild_id, channel_id).await {
        Ok(Some(sub)) if sub.is_active => {
            let _ = snapshot::put_chan_room(cache, guild_id, channel_id, sub.room_id).await;
            Ok(sub.room_id)
        }
        _ => {
            let _ = snapshot::put_chan_tombstone(cache, guild_id, channel_id).await;
            Err(PolicyRejection::NotSubscribed)
        }
    }
}

/// Drops every Cache entry that a `resolve` call for this channel may have
/// populated. Called by the Admin API after a subscription write so the
/// invalidation contract in §4.2/§4.10 holds.
pub async fn invalidate_channel(cache: &CachePool, guild_id: i64, channel_id: i64) {
    let _ = snapshot::drop_chan(cache, guild_id, channel_id).await;
}

pub async fn invalidate_room(cache: &CachePool, room_id: i64) {
    let _ = snapshot::drop_room(cache, room_id).await;
    let _ = snapshot::drop_perms(cache, room_id).await;
}
