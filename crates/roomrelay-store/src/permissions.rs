use crate::{DbError, DbPool};
use roomrelay_models::permissions::{PermissionsPatch, RoomPermissions};

pub async fn get_permissions(
    pool: &DbPool,
    room_id: i64,
) -> Result<Option<RoomPermissions>, DbError> {
    let row = sqlx::query_as::<_, RoomPermissions>(
        "SELECT room_id, allow_urls, allow_files, allow_mentions, allow_emojis,
                enable_bad_word_filter, max_message_length, rate_limit_seconds
         FROM room_permissions WHERE room_id = ?1",
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update_permissions(
    pool: &DbPool,
    room_id: i64,
    patch: &PermissionsPatch,
) -> Result<RoomPermissions, DbError> {
    let mut current = get_permissions(pool, room_id)
        .await?
        .ok_or(DbError::NotFound)?;
    current.apply_patch(patch);

    let row = sqlx::query_as::<_, RoomPermissions>(
        "UPDATE room_permissions SET
            allow_urls = ?2, allow_files = ?3, allow_mentions = ?4, allow_emojis = ?5,
            enable_bad_word_filter = ?6, max_message_length = ?7, rate_limit_seconds = ?8
         WHERE room_id = ?1
         RETURNING room_id, allow_urls, allow_files, allow_mentions, allow_emojis,
                   enable_bad_word_filter, max_message_length, rate_limit_seconds",
    )
    .bind(room_id)
    .bind(current.allow_urls)
    .bind(current.allow_files)
    .bind(current.allow_mentions)
    .bind(current.allow_emojis)
    .bind(current.enable_bad_word_filter)
    .bind(current.max_message_length)
    .bind(current.rate_limit_seconds)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> crate::DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn update_permissions_requires_existing_room() {
        let pool = test_pool().await;
        let err = update_permissions(&pool, 999, &PermissionsPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn update_permissions_persists_patch() {
        let pool = test_pool().await;
        crate::rooms::create_room(&pool, 1, "general", 1, 50)
            .await
            .unwrap();

        let updated = update_permissions(
            &pool,
            1,
            &PermissionsPatch {
                allow_urls: Some(false),
                rate_limit_seconds: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!updated.allow_urls);
        assert_eq!(updated.rate_limit_seconds, 5);

        let reloaded = get_permissions(&pool, 1).await.unwrap().unwrap();
        assert!(!reloaded.allow_urls);
    }
}
