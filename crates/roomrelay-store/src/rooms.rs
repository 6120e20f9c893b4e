use crate::{permissions, DbError, DbPool};
use roomrelay_models::room::{Room, RoomPatch, RoomWithChannelCount};

pub async fn create_room(
    pool: &DbPool,
    id: i64,
    name: &str,
    creator: i64,
    max_servers: i64,
) -> Result<Room, DbError> {
    let mut tx = pool.begin().await?;

    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM rooms WHERE lower(name) = lower(?1) AND is_active = TRUE",
    )
    .bind(name)
    .fetch_optional(&mut *tx)
    .await?;
    if existing.is_some() {
        return Err(DbError::NameTaken);
    }

    let room = sqlx::query_as::<_, Room>(
        "INSERT INTO rooms (id, name, created_by, created_at, max_servers, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, TRUE)
         RETURNING id, name, created_by, created_at, max_servers, is_active",
    )
    .bind(id)
    .bind(name)
    .bind(creator)
    .bind(chrono::Utc::now())
    .bind(max_servers)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO room_permissions
            (room_id, allow_urls, allow_files, allow_mentions, allow_emojis,
             enable_bad_word_filter, max_message_length, rate_limit_seconds)
         VALUES (?1, TRUE, TRUE, TRUE, TRUE, FALSE, 2000, 0)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(room)
}

pub async fn get_room(pool: &DbPool, id: i64) -> Result<Option<Room>, DbError> {
    let row = sqlx::query_as::<_, Room>(
        "SELECT id, name, created_by, created_at, max_servers, is_active FROM rooms WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update_room(pool: &DbPool, id: i64, patch: &RoomPatch) -> Result<Room, DbError> {
    let mut tx = pool.begin().await?;
    let current = sqlx::query_as::<_, Room>(
        "SELECT id, name, created_by, created_at, max_servers, is_active FROM rooms WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let name = patch.name.as_deref().unwrap_or(&current.name);
    if let Some(new_name) = &patch.name {
        let taken: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM rooms WHERE lower(name) = lower(?1) AND is_active = TRUE AND id != ?2",
        )
        .bind(new_name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if taken.is_some() {
            return Err(DbError::NameTaken);
        }
    }
    let max_servers = patch.max_servers.unwrap_or(current.max_servers);
    let is_active = patch.is_active.unwrap_or(current.is_active);

    let room = sqlx::query_as::<_, Room>(
        "UPDATE rooms SET name = ?2, max_servers = ?3, is_active = ?4 WHERE id = ?1
         RETURNING id, name, created_by, created_at, max_servers, is_active",
    )
    .bind(id)
    .bind(name)
    .bind(max_servers)
    .bind(is_active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(room)
}

/// Deletes the room, cascades its permissions row, and soft-deactivates its
/// subscriptions (audit trail is preserved).
pub async fn delete_room(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM rooms WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    sqlx::query("DELETE FROM room_permissions WHERE room_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE channel_subscriptions SET is_active = FALSE WHERE room_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn list_rooms(
    pool: &DbPool,
    include_inactive: bool,
) -> Result<Vec<RoomWithChannelCount>, DbError> {
    let sql = if include_inactive {
        "SELECT r.id, r.name, r.created_by, r.created_at, r.max_servers, r.is_active,
                COALESCE(COUNT(DISTINCT CASE WHEN s.is_active THEN s.guild_id END), 0) AS channel_count
         FROM rooms r
         LEFT JOIN channel_subscriptions s ON s.room_id = r.id
         GROUP BY r.id, r.name, r.created_by, r.created_at, r.max_servers, r.is_active
         ORDER BY r.id"
    } else {
        "SELECT r.id, r.name, r.created_by, r.created_at, r.max_servers, r.is_active,
                COALESCE(COUNT(DISTINCT CASE WHEN s.is_active THEN s.guild_id END), 0) AS channel_count
         FROM rooms r
         LEFT JOIN channel_subscriptions s ON s.room_id = r.id
         WHERE r.is_active = TRUE
         GROUP BY r.id, r.name, r.created_by, r.created_at, r.max_servers, r.is_active
         ORDER BY r.id"
    };

    let rows: Vec<(i64, String, i64, chrono::DateTime<chrono::Utc>, i64, bool, i64)> =
        sqlx::query_as(sql).fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, name, created_by, created_at, max_servers, is_active, channel_count)| {
                RoomWithChannelCount {
                    room: roomrelay_models::room::Room {
                        id,
                        name,
                        created_by,
                        created_at,
                        max_servers,
                        is_active,
                    },
                    channel_count,
                }
            },
        )
        .collect())
}

pub async fn count_active_guild_subscriptions(pool: &DbPool, room_id: i64) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT guild_id) FROM channel_subscriptions
         WHERE room_id = ?1 AND is_active = TRUE",
    )
    .bind(room_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub use permissions::{get_permissions, update_permissions};

#[cfg(test)]
mod tests {
    use super::*;
    use roomrelay_models::room::RoomPatch;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_room_seeds_default_permissions() {
        let pool = test_pool().await;
        let room = create_room(&pool, 1, "general", 1, 50).await.unwrap();
        assert_eq!(room.name, "general");
        let perms = get_permissions(&pool, room.id).await.unwrap().unwrap();
        assert!(perms.allow_urls);
        assert_eq!(perms.rate_limit_seconds, 0);
    }

    #[tokio::test]
    async fn create_room_rejects_duplicate_active_name_case_insensitively() {
        let pool = test_pool().await;
        create_room(&pool, 1, "General", 1, 50).await.unwrap();
        let err = create_room(&pool, 2, "GENERAL", 1, 50).await.unwrap_err();
        assert!(matches!(err, DbError::NameTaken));
    }

    #[tokio::test]
    async fn name_is_reusable_once_prior_room_is_deleted() {
        let pool = test_pool().await;
        let room = create_room(&pool, 1, "general", 1, 50).await.unwrap();
        delete_room(&pool, room.id).await.unwrap();
        let recreated = create_room(&pool, 2, "general", 1, 50).await.unwrap();
        assert_eq!(recreated.name, "general");
    }

    #[tokio::test]
    async fn delete_room_cascades_permissions_and_deactivates_subscriptions() {
        let pool = test_pool().await;
        let room = create_room(&pool, 1, "general", 1, 50).await.unwrap();
        crate::subscriptions::register_channel(&pool, 10, room.id, 100, 200, "g", "c", 1)
            .await
            .unwrap();

        delete_room(&pool, room.id).await.unwrap();

        assert!(get_permissions(&pool, room.id).await.unwrap().is_none());
        let subs = crate::subscriptions::list_by_room(&pool, room.id)
            .await
            .unwrap();
        assert!(!subs[0].is_active);
    }

    #[tokio::test]
    async fn delete_unknown_room_is_not_found() {
        let pool = test_pool().await;
        let err = delete_room(&pool, 999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn update_room_can_rename_and_deactivate() {
        let pool = test_pool().await;
        let room = create_room(&pool, 1, "general", 1, 50).await.unwrap();
        let updated = update_room(
            &pool,
            room.id,
            &RoomPatch {
                name: Some("renamed".into()),
                max_servers: Some(10),
                is_active: Some(false),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.max_servers, 10);
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn list_rooms_counts_distinct_active_guilds() {
        let pool = test_pool().await;
        let room = create_room(&pool, 1, "general", 1, 50).await.unwrap();
        crate::subscriptions::register_channel(&pool, 10, room.id, 100, 200, "g1", "c1", 1)
            .await
            .unwrap();
        crate::subscriptions::register_channel(&pool, 11, room.id, 100, 201, "g1", "c2", 1)
            .await
            .unwrap();
        crate::subscriptions::register_channel(&pool, 12, room.id, 101, 300, "g2", "c1", 1)
            .await
            .unwrap();

        let rooms = list_rooms(&pool, false).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].channel_count, 2);
    }
}
