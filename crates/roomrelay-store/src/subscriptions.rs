use crate::{bans, rooms, DbError, DbPool};
use roomrelay_models::subscription::Subscription;

/// Binds a channel to a room. Enforces subscription uniqueness, the room's
/// active/subscriber-limit invariants, and the guild ban list.
#[allow(clippy::too_many_arguments)]
pub async fn register_channel(
    pool: &DbPool,
    id: i64,
    room_id: i64,
    guild_id: i64,
    channel_id: i64,
    guild_name: &str,
    channel_name: &str,
    registered_by: i64,
) -> Result<Subscription, DbError> {
    if bans::is_guild_banned(pool, guild_id).await? {
        return Err(DbError::GuildBanned);
    }

    let room = rooms::get_room(pool, room_id).await?.ok_or(DbError::NotFound)?;
    if !room.is_active {
        return Err(DbError::RoomInactive);
    }

    let mut tx = pool.begin().await?;

    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM channel_subscriptions WHERE guild_id = ?1 AND channel_id = ?2 AND is_active = TRUE",
    )
    .bind(guild_id)
    .bind(channel_id)
    .fetch_optional(&mut *tx)
    .await?;
    if existing.is_some() {
        return Err(DbError::AlreadyBound);
    }

    let active_guilds: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT guild_id) FROM channel_subscriptions
         WHERE room_id = ?1 AND is_active = TRUE AND guild_id != ?2",
    )
    .bind(room_id)
    .bind(guild_id)
    .fetch_one(&mut *tx)
    .await?;
    if active_guilds >= room.max_servers {
        return Err(DbError::RoomFull);
    }

    let row = sqlx::query_as::<_, Subscription>(
        "INSERT INTO channel_subscriptions
            (id, room_id, guild_id, channel_id, guild_name, channel_name,
             registered_by, registered_at, is_active, last_message_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, TRUE, NULL)
         RETURNING id, room_id, guild_id, channel_id, guild_name, channel_name,
                   registered_by, registered_at, is_active, last_message_at",
    )
    .bind(id)
    .bind(room_id)
    .bind(guild_id)
    .bind(channel_id)
    .bind(guild_name)
    .bind(channel_name)
    .bind(registered_by)
    .bind(chrono::Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn unregister_channel(
    pool: &DbPool,
    room_id: i64,
    guild_id: i64,
    channel_id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE channel_subscriptions SET is_active = FALSE
         WHERE room_id = ?1 AND guild_id = ?2 AND channel_id = ?3 AND is_active = TRUE",
    )
    .bind(room_id)
    .bind(guild_id)
    .bind(channel_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Looks up the room bound to a channel, regardless of room/guild-ban state
/// (callers apply those checks themselves — this mirrors the Resolver's
/// two-step Cache-then-Store lookup).
pub async fn find_by_channel(
    pool: &DbPool,
    guild_id: i64,
    channel_id: i64,
) -> Result<Option<Subscription>, DbError> {
    let row = sqlx::query_as::<_, Subscription>(
        "SELECT id, room_id, guild_id, channel_id, guild_name, channel_name,
                registered_by, registered_at, is_active, last_message_at
         FROM channel_subscriptions
         WHERE guild_id = ?1 AND channel_id = ?2 AND is_active = TRUE",
    )
    .bind(guild_id)
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_by_room(pool: &DbPool, room_id: i64) -> Result<Vec<Subscription>, DbError> {
    let rows = sqlx::query_as::<_, Subscription>(
        "SELECT id, room_id, guild_id, channel_id, guild_name, channel_name,
                registered_by, registered_at, is_active, last_message_at
         FROM channel_subscriptions WHERE room_id = ?1 ORDER BY id",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_active_by_room(pool: &DbPool, room_id: i64) -> Result<Vec<Subscription>, DbError> {
    let rows = sqlx::query_as::<_, Subscription>(
        "SELECT id, room_id, guild_id, channel_id, guild_name, channel_name,
                registered_by, registered_at, is_active, last_message_at
         FROM channel_subscriptions WHERE room_id = ?1 AND is_active = TRUE ORDER BY id",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_by_guild(pool: &DbPool, guild_id: i64) -> Result<Vec<Subscription>, DbError> {
    let rows = sqlx::query_as::<_, Subscription>(
        "SELECT id, room_id, guild_id, channel_id, guild_name, channel_name,
                registered_by, registered_at, is_active, last_message_at
         FROM channel_subscriptions WHERE guild_id = ?1 ORDER BY id",
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Marks a subscription permanently dead after the Fan-Out Engine reports a
/// non-retryable delivery failure, without touching any other subscription.
pub async fn deactivate(pool: &DbPool, subscription_id: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE channel_subscriptions SET is_active = FALSE WHERE id = ?1")
        .bind(subscription_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn touch_last_message(pool: &DbPool, subscription_id: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE channel_subscriptions SET last_message_at = ?2 WHERE id = ?1")
        .bind(subscription_id)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

/// One row per distinct guild with at least one subscription, for the
/// servers listing routes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GuildSummary {
    pub guild_id: i64,
    pub guild_name: String,
    pub channel_count: i64,
    pub is_banned: bool,
}

pub async fn list_guild_summaries(pool: &DbPool, active_only: bool) -> Result<Vec<GuildSummary>, DbError> {
    let sql = if active_only {
        "SELECT s.guild_id, MAX(s.guild_name) AS guild_name, COUNT(*) AS channel_count,
                COALESCE(MAX(CASE WHEN b.is_active THEN 1 ELSE 0 END), 0) AS is_banned
         FROM channel_subscriptions s
         LEFT JOIN guild_bans b ON b.guild_id = s.guild_id
         WHERE s.is_active = TRUE
         GROUP BY s.guild_id
         ORDER BY s.guild_id"
    } else {
        "SELECT s.guild_id, MAX(s.guild_name) AS guild_name, COUNT(*) AS channel_count,
                COALESCE(MAX(CASE WHEN b.is_active THEN 1 ELSE 0 END), 0) AS is_banned
         FROM channel_subscriptions s
         LEFT JOIN guild_bans b ON b.guild_id = s.guild_id
         GROUP BY s.guild_id
         ORDER BY s.guild_id"
    };
    let rows: Vec<(i64, String, i64, i64)> = sqlx::query_as(sql).fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(guild_id, guild_name, channel_count, is_banned)| GuildSummary {
            guild_id,
            guild_name,
            channel_count,
            is_banned: is_banned != 0,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        crate::rooms::create_room(&pool, 1, "general", 1, 2).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn register_channel_enforces_uniqueness() {
        let pool = test_pool().await;
        register_channel(&pool, 1, 1, 100, 200, "g", "c", 1)
            .await
            .unwrap();
        let err = register_channel(&pool, 2, 1, 100, 200, "g", "c", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyBound));
    }

    #[tokio::test]
    async fn register_channel_enforces_max_servers() {
        let pool = test_pool().await; // max_servers = 2
        register_channel(&pool, 1, 1, 100, 200, "g1", "c1", 1).await.unwrap();
        register_channel(&pool, 2, 1, 101, 201, "g2", "c2", 1).await.unwrap();
        let err = register_channel(&pool, 3, 1, 102, 202, "g3", "c3", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::RoomFull));
    }

    #[tokio::test]
    async fn register_channel_rejects_banned_guild() {
        let pool = test_pool().await;
        crate::bans::ban_guild(&pool, 100, "g1", "spam", 1).await.unwrap();
        let err = register_channel(&pool, 1, 1, 100, 200, "g1", "c1", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::GuildBanned));
    }

    #[tokio::test]
    async fn register_channel_rejects_inactive_room() {
        let pool = test_pool().await;
        crate::rooms::update_room(
            &pool,
            1,
            &roomrelay_models::room::RoomPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let err = register_channel(&pool, 1, 1, 100, 200, "g", "c", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::RoomInactive));
    }

    #[tokio::test]
    async fn unregister_then_reregister_same_channel_is_allowed() {
        let pool = test_pool().await;
        register_channel(&pool, 1, 1, 100, 200, "g", "c", 1).await.unwrap();
        unregister_channel(&pool, 1, 100, 200).await.unwrap();
        let again = register_channel(&pool, 2, 1, 100, 200, "g", "c", 1).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn find_by_channel_ignores_inactive_subscriptions() {
        let pool = test_pool().await;
        register_channel(&pool, 1, 1, 100, 200, "g", "c", 1).await.unwrap();
        unregister_channel(&pool, 1, 100, 200).await.unwrap();
        assert!(find_by_channel(&pool, 100, 200).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn guild_summaries_report_channel_count_and_ban_state() {
        let pool = test_pool().await;
        register_channel(&pool, 1, 1, 100, 200, "g1", "c1", 1).await.unwrap();
        register_channel(&pool, 2, 1, 100, 201, "g1", "c2", 1).await.unwrap();
        crate::bans::ban_guild(&pool, 100, "g1", "spam", 1).await.unwrap();

        let summaries = list_guild_summaries(&pool, false).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].channel_count, 2);
        assert!(summaries[0].is_banned);
    }
}
