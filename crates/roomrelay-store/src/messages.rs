use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use roomrelay_models::message_log::{AttachmentRef, MessageLogEntry, NewMessageLogEntry, ReplyContext};

#[derive(sqlx::FromRow)]
struct LogRow {
    id: i64,
    room_id: i64,
    source_guild_id: i64,
    source_channel_id: i64,
    source_message_id: i64,
    author_id: i64,
    author_display: String,
    content: String,
    attachments_json: String,
    reply_to_json: Option<String>,
    timestamp: DateTime<Utc>,
    delivered_count: i64,
    failed_count: i64,
}

impl LogRow {
    fn into_entry(self) -> Result<MessageLogEntry, DbError> {
        let attachments: Vec<AttachmentRef> = serde_json::from_str(&self.attachments_json)
            .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;
        let reply_to: Option<ReplyContext> = match self.reply_to_json {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?,
            ),
            None => None,
        };
        Ok(MessageLogEntry {
            id: self.id,
            room_id: self.room_id,
            source_guild_id: self.source_guild_id,
            source_channel_id: self.source_channel_id,
            source_message_id: self.source_message_id,
            author_id: self.author_id,
            author_display: self.author_display,
            content: self.content,
            attachments,
            reply_to,
            timestamp: self.timestamp,
            delivered_count: self.delivered_count,
            failed_count: self.failed_count,
        })
    }
}

const SELECT_COLUMNS: &str = "id, room_id, source_guild_id, source_channel_id, source_message_id,
        author_id, author_display, content, attachments_json, reply_to_json,
        timestamp, delivered_count, failed_count";

/// Appends an immutable log entry. Never blocks the relay path on anything
/// beyond a single insert; callers on a hot path should route this through a
/// dedicated writer connection if Store contention becomes visible.
pub async fn append_message_log(
    pool: &DbPool,
    entry: &NewMessageLogEntry,
) -> Result<MessageLogEntry, DbError> {
    let attachments_json = serde_json::to_string(&entry.attachments)
        .map_err(|e| DbError::Sqlx(sqlx::Error::Encode(Box::new(e))))?;
    let reply_to_json = entry
        .reply_to
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DbError::Sqlx(sqlx::Error::Encode(Box::new(e))))?;

    let sql = format!(
        "INSERT INTO message_log
            (id, room_id, source_guild_id, source_channel_id, source_message_id,
             author_id, author_display, content, attachments_json, reply_to_json,
             timestamp, delivered_count, failed_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         RETURNING {SELECT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, LogRow>(&sql)
        .bind(entry.id)
        .bind(entry.room_id)
        .bind(entry.source_guild_id)
        .bind(entry.source_channel_id)
        .bind(entry.source_message_id)
        .bind(entry.author_id)
        .bind(&entry.author_display)
        .bind(&entry.content)
        .bind(attachments_json)
        .bind(reply_to_json)
        .bind(chrono::Utc::now())
        .bind(entry.delivered_count)
        .bind(entry.failed_count)
        .fetch_one(pool)
        .await?;
    row.into_entry()
}

pub async fn list_room_messages(
    pool: &DbPool,
    room_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<MessageLogEntry>, DbError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM message_log
         WHERE room_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2 OFFSET ?3"
    );
    let rows: Vec<LogRow> = sqlx::query_as(&sql)
        .bind(room_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(LogRow::into_entry).collect()
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RoomStats {
    pub room_id: i64,
    pub message_count: i64,
    pub delivered_total: i64,
    pub failed_total: i64,
}

pub async fn room_stats(
    pool: &DbPool,
    room_id: i64,
    since: DateTime<Utc>,
) -> Result<RoomStats, DbError> {
    let row: (i64, Option<i64>, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), SUM(delivered_count), SUM(failed_count)
         FROM message_log WHERE room_id = ?1 AND timestamp >= ?2",
    )
    .bind(room_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(RoomStats {
        room_id,
        message_count: row.0,
        delivered_total: row.1.unwrap_or(0),
        failed_total: row.2.unwrap_or(0),
    })
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GuildStats {
    pub guild_id: i64,
    pub message_count: i64,
}

pub async fn guild_stats(
    pool: &DbPool,
    guild_id: i64,
    since: DateTime<Utc>,
) -> Result<GuildStats, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM message_log WHERE source_guild_id = ?1 AND timestamp >= ?2",
    )
    .bind(guild_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(GuildStats {
        guild_id,
        message_count: count,
    })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DailyMessageCount {
    pub date: chrono::NaiveDate,
    pub count: i64,
}

/// Per-day message counts for the trailing `days` days, counting today. One
/// bounded range query per day rather than a `GROUP BY date(...)` so the
/// query stays portable across the sqlite and postgres backends `Any`
/// straddles.
pub async fn messages_per_day(pool: &DbPool, days: i64) -> Result<Vec<DailyMessageCount>, DbError> {
    let days = days.max(1);
    let today = Utc::now().date_naive();
    let mut out = Vec::with_capacity(days as usize);
    for offset in (0..days).rev() {
        let date = today - chrono::Duration::days(offset);
        let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end = start + chrono::Duration::days(1);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM message_log WHERE timestamp >= ?1 AND timestamp < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;
        out.push(DailyMessageCount { date, count });
    }
    Ok(out)
}

/// Filters for `GET /analytics/export/messages`. Every field is optional;
/// an empty filter exports the whole log subject to `limit`.
#[derive(Debug, Clone, Default)]
pub struct MessageExportFilter {
    pub room_id: Option<i64>,
    pub source_guild_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

pub async fn export_messages(
    pool: &DbPool,
    filter: &MessageExportFilter,
    limit: i64,
) -> Result<Vec<MessageLogEntry>, DbError> {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM message_log");
    let mut clauses = Vec::new();
    let mut idx = 0;
    if filter.room_id.is_some() {
        idx += 1;
        clauses.push(format!("room_id = ?{idx}"));
    }
    if filter.source_guild_id.is_some() {
        idx += 1;
        clauses.push(format!("source_guild_id = ?{idx}"));
    }
    if filter.since.is_some() {
        idx += 1;
        clauses.push(format!("timestamp >= ?{idx}"));
    }
    if filter.until.is_some() {
        idx += 1;
        clauses.push(format!("timestamp < ?{idx}"));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY timestamp DESC, id DESC LIMIT ?{}", idx + 1));

    let mut query = sqlx::query_as::<_, LogRow>(&sql);
    if let Some(v) = filter.room_id {
        query = query.bind(v);
    }
    if let Some(v) = filter.source_guild_id {
        query = query.bind(v);
    }
    if let Some(v) = filter.since {
        query = query.bind(v);
    }
    if let Some(v) = filter.until {
        query = query.bind(v);
    }
    let rows: Vec<LogRow> = query.bind(limit).fetch_all(pool).await?;
    rows.into_iter().map(LogRow::into_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    fn sample_entry(id: i64, room_id: i64) -> NewMessageLogEntry {
        NewMessageLogEntry {
            id,
            room_id,
            source_guild_id: 1,
            source_channel_id: 2,
            source_message_id: id * 10,
            author_id: 5,
            author_display: "alice".into(),
            content: "hi".into(),
            attachments: vec![],
            reply_to: None,
            delivered_count: 2,
            failed_count: 0,
        }
    }

    #[tokio::test]
    async fn append_and_list_round_trips() {
        let pool = test_pool().await;
        append_message_log(&pool, &sample_entry(1, 1)).await.unwrap();
        append_message_log(&pool, &sample_entry(2, 1)).await.unwrap();

        let rows = list_room_messages(&pool, 1, 50, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].content, "hi");
    }

    #[tokio::test]
    async fn log_entries_survive_independent_of_room_lifecycle() {
        let pool = test_pool().await;
        crate::rooms::create_room(&pool, 1, "general", 1, 50).await.unwrap();
        append_message_log(&pool, &sample_entry(1, 1)).await.unwrap();
        crate::rooms::delete_room(&pool, 1).await.unwrap();

        let rows = list_room_messages(&pool, 1, 50, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn room_stats_aggregates_counts() {
        let pool = test_pool().await;
        append_message_log(&pool, &sample_entry(1, 1)).await.unwrap();
        append_message_log(&pool, &sample_entry(2, 1)).await.unwrap();

        let stats = room_stats(&pool, 1, chrono::Utc::now() - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(stats.message_count, 2);
        assert_eq!(stats.delivered_total, 4);
    }

    #[tokio::test]
    async fn messages_per_day_buckets_todays_count_on_the_last_row() {
        let pool = test_pool().await;
        append_message_log(&pool, &sample_entry(1, 1)).await.unwrap();

        let buckets = messages_per_day(&pool, 7).await.unwrap();
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets.last().unwrap().count, 1);
    }

    #[tokio::test]
    async fn export_messages_filters_by_room_and_respects_limit() {
        let pool = test_pool().await;
        append_message_log(&pool, &sample_entry(1, 1)).await.unwrap();
        append_message_log(&pool, &sample_entry(2, 2)).await.unwrap();

        let filter = MessageExportFilter {
            room_id: Some(1),
            ..Default::default()
        };
        let rows = export_messages(&pool, &filter, 50).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].room_id, 1);
    }
}
