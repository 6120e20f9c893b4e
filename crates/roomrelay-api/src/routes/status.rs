use axum::extract::State;
use axum::Json;
use roomrelay_core::AppState;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AdminUser;

/// Public liveness probe. Deliberately reveals nothing about deployment
/// internals beyond "the process is answering requests".
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Authenticated deployment summary. Room/subscription counts double as a
/// cheap sanity check that the Store connection this process holds is the
/// one actually serving the relay.
pub async fn info(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let rooms = roomrelay_store::rooms::list_rooms(&state.store, true).await?;
    let active_rooms = rooms.iter().filter(|r| r.room.is_active).count();
    let active_subscriptions: i64 = rooms.iter().map(|r| r.channel_count).sum();

    Ok(Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "engine": roomrelay_store::active_database_engine().as_str(),
        "room_count": rooms.len(),
        "active_room_count": active_rooms,
        "active_subscription_count": active_subscriptions,
        "messages_relayed": state.metrics.messages_relayed.load(std::sync::atomic::Ordering::Relaxed),
        "messages_rejected": state.metrics.messages_rejected.load(std::sync::atomic::Ordering::Relaxed),
    })))
}
