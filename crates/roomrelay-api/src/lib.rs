use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use roomrelay_core::AppState;

pub mod error;
pub mod middleware;
pub mod routes;

/// Snowflake generator worker id for entities the Admin API mints directly
/// (rooms, subscriptions). Distinct from the Relay Coordinator's so the two
/// paths never race on the same per-millisecond sequence counter.
pub(crate) const API_WORKER_ID: u16 = 2;

pub fn build_router(config: &roomrelay_core::AppConfig) -> Router<AppState> {
    Router::new()
        .route("/api/status", get(routes::status::status))
        .route("/api/info", get(routes::status::info))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/rooms",
            get(routes::rooms::list_rooms).post(routes::rooms::create_room),
        )
        .route(
            "/api/rooms/{id}",
            get(routes::rooms::get_room)
                .put(routes::rooms::update_room)
                .delete(routes::rooms::delete_room),
        )
        .route(
            "/api/rooms/{id}/permissions",
            get(routes::rooms::get_permissions).put(routes::rooms::update_permissions),
        )
        .route(
            "/api/rooms/{id}/channels",
            get(routes::rooms::list_channels).post(routes::rooms::register_channel),
        )
        .route(
            "/api/rooms/{id}/channels/{guild_id}/{channel_id}",
            axum::routing::delete(routes::rooms::unregister_channel),
        )
        .route("/api/rooms/{id}/messages", get(routes::rooms::list_messages))
        .route("/api/servers", get(routes::servers::list_servers))
        .route("/api/servers/{guild_id}", get(routes::servers::get_server))
        .route(
            "/api/servers/{guild_id}/channels",
            get(routes::servers::list_channels),
        )
        .route(
            "/api/servers/{guild_id}/stats",
            get(routes::servers::stats),
        )
        .route(
            "/api/servers/{guild_id}/activity",
            get(routes::servers::activity),
        )
        .route(
            "/api/servers/bulk/refresh-cache",
            post(routes::servers::bulk_refresh_cache),
        )
        .route(
            "/api/servers/bans",
            get(routes::servers::list_bans).post(routes::servers::ban_guild),
        )
        .route(
            "/api/servers/bans/{guild_id}",
            axum::routing::delete(routes::servers::unban_guild),
        )
        .route("/api/analytics/live", get(routes::analytics::live))
        .route("/api/analytics/messages", get(routes::analytics::messages))
        .route(
            "/api/analytics/rooms/{id}/stats",
            get(routes::analytics::room_stats),
        )
        .route("/api/analytics/health", get(routes::analytics::health))
        .route("/api/analytics/trends", get(routes::analytics::trends))
        .route(
            "/api/analytics/export/messages",
            get(routes::analytics::export_messages),
        )
        .layer(build_cors_layer(config))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Restricted to `ALLOWED_ORIGINS` unless the deployment leaves it empty, in
/// which case every origin is allowed (a bare-bones local/dev default, not a
/// recommended production posture).
fn build_cors_layer(config: &roomrelay_core::AppConfig) -> tower_http::cors::CorsLayer {
    let layer = tower_http::cors::CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(tower_http::cors::Any);

    if config.allowed_origins.is_empty() {
        layer.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<_> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
