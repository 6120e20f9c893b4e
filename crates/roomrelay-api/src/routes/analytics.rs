use axum::extract::{Path, Query, State};
use axum::Json;
use roomrelay_core::AppState;
use roomrelay_models::live_push::LiveStats;
use roomrelay_store::messages::{DailyMessageCount, MessageExportFilter, RoomStats};
use serde_json::json;
use std::sync::atomic::Ordering;

use crate::error::ApiError;
use crate::middleware::AdminUser;

/// The Live Push Hub writes a fresher snapshot every few seconds; fall back
/// to deriving one from process-local counters when nothing has been
/// published yet (e.g. right after startup, before the first tick).
pub async fn live(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<LiveStats>, ApiError> {
    if let Some(stats) = roomrelay_cache::snapshot::get_live_stats(&state.cache).await? {
        return Ok(Json(stats));
    }

    let rooms = roomrelay_store::rooms::list_rooms(&state.store, false).await?;
    let active_subscriptions: i64 = rooms.iter().map(|r| r.channel_count).sum();
    Ok(Json(LiveStats {
        connected_dashboards: 0,
        active_rooms: rooms.len() as i64,
        active_subscriptions,
        messages_relayed_last_minute: state.metrics.messages_relayed.load(Ordering::Relaxed) as i64,
        messages_rejected_last_minute: state.metrics.messages_rejected.load(Ordering::Relaxed) as i64,
    }))
}

#[derive(Debug, serde::Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

pub async fn messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<DailyMessageCount>>, ApiError> {
    let rows = roomrelay_store::messages::messages_per_day(&state.store, query.days.unwrap_or(30)).await?;
    Ok(Json(rows))
}

pub async fn room_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<RoomStats>, ApiError> {
    let since = chrono::Utc::now() - chrono::Duration::days(query.days.unwrap_or(7).max(1));
    let stats = roomrelay_store::messages::room_stats(&state.store, id, since).await?;
    Ok(Json(stats))
}

/// Liveness/readiness for both backing services. Doubles as `GET /status`'s
/// authenticated, detail-bearing sibling.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.store)
        .await
        .is_ok();

    let cache_ok = {
        let mut conn = state.cache.connection();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    };

    let healthy = store_ok && cache_ok;
    Json(json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "store": if store_ok { "ok" } else { "unreachable" },
        "cache": if cache_ok { "ok" } else { "unreachable" },
    }))
}

#[derive(Debug, serde::Deserialize)]
pub struct TrendsQuery {
    pub period: Option<String>,
}

pub async fn trends(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<Vec<DailyMessageCount>>, ApiError> {
    let days = match query.period.as_deref() {
        Some("day") => 1,
        Some("month") => 30,
        _ => 7, // "week" and anything unrecognized default to a 7-day trend
    };
    let rows = roomrelay_store::messages::messages_per_day(&state.store, days).await?;
    Ok(Json(rows))
}

#[derive(Debug, serde::Deserialize)]
pub struct ExportQuery {
    pub room_id: Option<i64>,
    pub guild_id: Option<i64>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
    pub until: Option<chrono::DateTime<chrono::Utc>>,
    pub limit: Option<i64>,
}

pub async fn export_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ExportQuery>,
) -> Result<Json<Vec<roomrelay_models::message_log::MessageLogEntry>>, ApiError> {
    let filter = MessageExportFilter {
        room_id: query.room_id,
        source_guild_id: query.guild_id,
        since: query.since,
        until: query.until,
    };
    let limit = query.limit.unwrap_or(1000).clamp(1, 10_000);
    let rows = roomrelay_store::messages::export_messages(&state.store, &filter, limit).await?;
    Ok(Json(rows))
}
