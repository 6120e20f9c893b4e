use axum::extract::{Path, Query, State};
use axum::Json;
use roomrelay_cache::pubsub::{self, Topic};
use roomrelay_core::AppState;
use roomrelay_models::permissions::{PermissionsPatch, RoomPermissions};
use roomrelay_models::room::{CreateRoom, Room, RoomPatch, RoomWithChannelCount};
use roomrelay_models::subscription::{RegisterChannel, Subscription};
use roomrelay_util::pagination::{Page, PaginationParams};
use roomrelay_util::validation;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::AdminUser;

#[derive(Debug, serde::Deserialize)]
pub struct ListRoomsQuery {
    pub include_inactive: Option<bool>,
}

pub async fn list_rooms(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<RoomWithChannelCount>>, ApiError> {
    let rooms =
        roomrelay_store::rooms::list_rooms(&state.store, query.include_inactive.unwrap_or(false))
            .await?;
    Ok(Json(rooms))
}

pub async fn create_room(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(body): Json<CreateRoom>,
) -> Result<Json<Room>, ApiError> {
    validation::validate_room_name(&body.name).map_err(|e| ApiError::Validation(e.to_string()))?;
    let max_servers = body.max_servers.unwrap_or(50);
    validation::validate_max_servers(max_servers).map_err(|e| ApiError::Validation(e.to_string()))?;

    let id = roomrelay_util::snowflake::generate(crate::API_WORKER_ID);
    let creator = super::admin_principal_id(&admin);
    let room = roomrelay_store::rooms::create_room(&state.store, id, &body.name, creator, max_servers)
        .await?;

    notify_room_update(&state, room.id, json!({ "created": true })).await;
    Ok(Json(room))
}

pub async fn get_room(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Room>, ApiError> {
    let room = roomrelay_store::rooms::get_room(&state.store, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(room))
}

pub async fn update_room(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(patch): Json<RoomPatch>,
) -> Result<Json<Room>, ApiError> {
    if let Some(name) = &patch.name {
        validation::validate_room_name(name).map_err(|e| ApiError::Validation(e.to_string()))?;
    }
    if let Some(max_servers) = patch.max_servers {
        validation::validate_max_servers(max_servers)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let room = roomrelay_store::rooms::update_room(&state.store, id, &patch).await?;
    let _ = roomrelay_cache::snapshot::drop_room(&state.cache, id).await;
    let _ = roomrelay_cache::snapshot::drop_perms(&state.cache, id).await;
    notify_room_update(&state, id, json!({ "updated": true })).await;
    Ok(Json(room))
}

pub async fn delete_room(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    roomrelay_store::rooms::delete_room(&state.store, id).await?;
    let _ = roomrelay_cache::snapshot::drop_room(&state.cache, id).await;
    let _ = roomrelay_cache::snapshot::drop_perms(&state.cache, id).await;
    notify_room_update(&state, id, json!({ "deleted": true })).await;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn get_permissions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<RoomPermissions>, ApiError> {
    let perms = roomrelay_store::permissions::get_permissions(&state.store, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(perms))
}

pub async fn update_permissions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(patch): Json<PermissionsPatch>,
) -> Result<Json<RoomPermissions>, ApiError> {
    if let Some(len) = patch.max_message_length {
        validation::validate_max_message_length(len)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }
    if let Some(secs) = patch.rate_limit_seconds {
        validation::validate_rate_limit_seconds(secs)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let perms = roomrelay_store::permissions::update_permissions(&state.store, id, &patch).await?;
    let _ = roomrelay_cache::snapshot::drop_perms(&state.cache, id).await;
    notify_room_update(&state, id, json!({ "permissions_updated": true })).await;
    Ok(Json(perms))
}

pub async fn list_channels(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    let subs = roomrelay_store::subscriptions::list_by_room(&state.store, id).await?;
    Ok(Json(subs))
}

pub async fn register_channel(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<RegisterChannel>,
) -> Result<Json<Subscription>, ApiError> {
    let sub_id = roomrelay_util::snowflake::generate(crate::API_WORKER_ID);
    let registered_by = super::admin_principal_id(&admin);
    let sub = roomrelay_store::subscriptions::register_channel(
        &state.store,
        sub_id,
        id,
        body.guild_id,
        body.channel_id,
        &body.guild_name,
        &body.channel_name,
        registered_by,
    )
    .await?;

    let _ = roomrelay_cache::snapshot::put_chan_room(
        &state.cache,
        body.guild_id,
        body.channel_id,
        id,
    )
    .await;
    notify_channel_update(&state, id, json!({ "subscription_id": sub.id, "is_active": true })).await;
    Ok(Json(sub))
}

pub async fn unregister_channel(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, guild_id, channel_id)): Path<(i64, i64, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    roomrelay_store::subscriptions::unregister_channel(&state.store, id, guild_id, channel_id)
        .await?;
    let _ = roomrelay_cache::snapshot::drop_chan(&state.cache, guild_id, channel_id).await;
    notify_channel_update(&state, id, json!({ "guild_id": guild_id, "channel_id": channel_id, "is_active": false })).await;
    Ok(Json(json!({ "unregistered": true })))
}

pub async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Page<roomrelay_models::message_log::MessageLogEntry>>, ApiError> {
    let limit = pagination.limit();
    let offset = pagination.offset();
    let rows = roomrelay_store::messages::list_room_messages(&state.store, id, limit, offset).await?;
    Ok(Json(Page::new(rows, limit, offset)))
}

async fn notify_room_update(state: &AppState, room_id: i64, payload: serde_json::Value) {
    let _ = pubsub::publish(
        &state.cache,
        Topic::RoomUpdate,
        &roomrelay_models::live_push::ServerFrame::RoomUpdate { room_id, payload: payload.clone() },
    )
    .await;
    let _ = pubsub::publish(&state.cache, Topic::Invalidate, &json!({ "room_id": room_id })).await;
}

async fn notify_channel_update(state: &AppState, room_id: i64, payload: serde_json::Value) {
    let _ = pubsub::publish(
        &state.cache,
        Topic::ChannelUpdate,
        &roomrelay_models::live_push::ServerFrame::ChannelUpdate { room_id, payload: payload.clone() },
    )
    .await;
    let _ = pubsub::publish(&state.cache, Topic::Invalidate, &json!({ "room_id": room_id })).await;
}
