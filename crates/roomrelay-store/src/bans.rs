use crate::{DbError, DbPool};
use roomrelay_models::ban::GuildBan;

pub async fn ban_guild(
    pool: &DbPool,
    guild_id: i64,
    guild_name: &str,
    reason: &str,
    actor: i64,
) -> Result<GuildBan, DbError> {
    let row = sqlx::query_as::<_, GuildBan>(
        "INSERT INTO guild_bans (guild_id, guild_name, reason, banned_by, banned_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, TRUE)
         ON CONFLICT (guild_id) DO UPDATE SET
            guild_name = ?2, reason = ?3, banned_by = ?4, banned_at = ?5,
            is_active = TRUE, unbanned_at = NULL, unbanned_by = NULL
         RETURNING guild_id, guild_name, reason, banned_by, banned_at, is_active, unbanned_at, unbanned_by",
    )
    .bind(guild_id)
    .bind(guild_name)
    .bind(reason)
    .bind(actor)
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn unban_guild(pool: &DbPool, guild_id: i64, actor: i64) -> Result<GuildBan, DbError> {
    let row = sqlx::query_as::<_, GuildBan>(
        "UPDATE guild_bans
         SET is_active = FALSE, unbanned_at = ?2, unbanned_by = ?3
         WHERE guild_id = ?1
         RETURNING guild_id, guild_name, reason, banned_by, banned_at, is_active, unbanned_at, unbanned_by",
    )
    .bind(guild_id)
    .bind(chrono::Utc::now())
    .bind(actor)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

pub async fn get_ban(pool: &DbPool, guild_id: i64) -> Result<Option<GuildBan>, DbError> {
    let row = sqlx::query_as::<_, GuildBan>(
        "SELECT guild_id, guild_name, reason, banned_by, banned_at, is_active, unbanned_at, unbanned_by
         FROM guild_bans WHERE guild_id = ?1",
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn is_guild_banned(pool: &DbPool, guild_id: i64) -> Result<bool, DbError> {
    let row = get_ban(pool, guild_id).await?;
    Ok(row.map(|b| b.is_active).unwrap_or(false))
}

pub async fn list_bans(pool: &DbPool, include_inactive: bool) -> Result<Vec<GuildBan>, DbError> {
    let rows = if include_inactive {
        sqlx::query_as::<_, GuildBan>(
            "SELECT guild_id, guild_name, reason, banned_by, banned_at, is_active, unbanned_at, unbanned_by
             FROM guild_bans ORDER BY banned_at DESC",
        )
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, GuildBan>(
            "SELECT guild_id, guild_name, reason, banned_by, banned_at, is_active, unbanned_at, unbanned_by
             FROM guild_bans WHERE is_active = TRUE ORDER BY banned_at DESC",
        )
        .fetch_all(pool)
        .await?
    };
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn ban_then_unban_roundtrips() {
        let pool = test_pool().await;
        let ban = ban_guild(&pool, 1, "spammy guild", "spam", 99)
            .await
            .unwrap();
        assert!(ban.is_active);
        assert!(is_guild_banned(&pool, 1).await.unwrap());

        let unbanned = unban_guild(&pool, 1, 99).await.unwrap();
        assert!(!unbanned.is_active);
        assert!(!is_guild_banned(&pool, 1).await.unwrap());
    }

    #[tokio::test]
    async fn list_bans_filters_inactive_by_default() {
        let pool = test_pool().await;
        ban_guild(&pool, 1, "a", "x", 1).await.unwrap();
        ban_guild(&pool, 2, "b", "y", 1).await.unwrap();
        unban_guild(&pool, 2, 1).await.unwrap();

        let active_only = list_bans(&pool, false).await.unwrap();
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].guild_id, 1);

        let all = list_bans(&pool, true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn unban_unknown_guild_is_not_found() {
        let pool = test_pool().await;
        let err = unban_guild(&pool, 404, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
