use axum::extract::{Path, Query, State};
use axum::Json;
use roomrelay_cache::pubsub::{self, Topic};
use roomrelay_core::AppState;
use roomrelay_models::ban::{BanGuild, GuildBan};
use roomrelay_models::subscription::Subscription;
use roomrelay_store::subscriptions::GuildSummary;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::AdminUser;

#[derive(Debug, serde::Deserialize)]
pub struct ActiveOnlyQuery {
    pub active_only: Option<bool>,
}

pub async fn list_servers(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ActiveOnlyQuery>,
) -> Result<Json<Vec<GuildSummary>>, ApiError> {
    let summaries = roomrelay_store::subscriptions::list_guild_summaries(
        &state.store,
        query.active_only.unwrap_or(false),
    )
    .await?;
    Ok(Json(summaries))
}

pub async fn get_server(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(guild_id): Path<i64>,
) -> Result<Json<GuildSummary>, ApiError> {
    let summaries = roomrelay_store::subscriptions::list_guild_summaries(&state.store, false).await?;
    summaries
        .into_iter()
        .find(|s| s.guild_id == guild_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn list_channels(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(guild_id): Path<i64>,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    let subs = roomrelay_store::subscriptions::list_by_guild(&state.store, guild_id).await?;
    Ok(Json(subs))
}

#[derive(Debug, serde::Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(guild_id): Path<i64>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<roomrelay_store::messages::GuildStats>, ApiError> {
    let since = chrono::Utc::now() - chrono::Duration::days(query.days.unwrap_or(7).max(1));
    let stats = roomrelay_store::messages::guild_stats(&state.store, guild_id, since).await?;
    Ok(Json(stats))
}

#[derive(Debug, serde::Deserialize)]
pub struct HoursQuery {
    pub hours: Option<i64>,
}

pub async fn activity(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(guild_id): Path<i64>,
    Query(query): Query<HoursQuery>,
) -> Result<Json<roomrelay_store::messages::GuildStats>, ApiError> {
    let since = chrono::Utc::now() - chrono::Duration::hours(query.hours.unwrap_or(24).max(1));
    let stats = roomrelay_store::messages::guild_stats(&state.store, guild_id, since).await?;
    Ok(Json(stats))
}

/// Drops every cached room/permissions/channel-binding entry so the next
/// lookup repopulates from Store. Meant for operators recovering from a
/// suspected Cache/Store divergence, not for routine use.
pub async fn bulk_refresh_cache(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rooms = roomrelay_store::rooms::list_rooms(&state.store, true).await?;
    for room in &rooms {
        let _ = roomrelay_cache::snapshot::drop_room(&state.cache, room.room.id).await;
        let _ = roomrelay_cache::snapshot::drop_perms(&state.cache, room.room.id).await;
        let subs = roomrelay_store::subscriptions::list_by_room(&state.store, room.room.id).await?;
        for sub in subs {
            let _ = roomrelay_cache::snapshot::drop_chan(&state.cache, sub.guild_id, sub.channel_id).await;
        }
    }
    let _ = pubsub::publish(&state.cache, Topic::Invalidate, &json!({ "scope": "all" })).await;
    Ok(Json(json!({ "rooms_refreshed": rooms.len() })))
}

#[derive(Debug, serde::Deserialize)]
pub struct IncludeInactiveQuery {
    pub include_inactive: Option<bool>,
}

pub async fn list_bans(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<IncludeInactiveQuery>,
) -> Result<Json<Vec<GuildBan>>, ApiError> {
    let bans = roomrelay_store::bans::list_bans(&state.store, query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(bans))
}

pub async fn ban_guild(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(body): Json<BanGuild>,
) -> Result<Json<GuildBan>, ApiError> {
    let actor = super::admin_principal_id(&admin);
    let ban = roomrelay_store::bans::ban_guild(
        &state.store,
        body.guild_id,
        &body.guild_name,
        &body.reason,
        actor,
    )
    .await?;

    let _ = pubsub::publish(
        &state.cache,
        Topic::SystemNotification,
        &roomrelay_models::live_push::ServerFrame::SystemNotification {
            message: format!("guild {} banned: {}", body.guild_id, body.reason),
            severity: "warning".into(),
        },
    )
    .await;
    Ok(Json(ban))
}

pub async fn unban_guild(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(guild_id): Path<i64>,
) -> Result<Json<GuildBan>, ApiError> {
    let actor = super::admin_principal_id(&admin);
    let ban = roomrelay_store::bans::unban_guild(&state.store, guild_id, actor).await?;
    Ok(Json(ban))
}
