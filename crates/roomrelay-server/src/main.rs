use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .flatten_event(true)
        .init();

    tracing::info!(bind_address = %config.server.bind_address, "starting roomrelay-server");
    // The chat-platform gateway SDK itself lives outside this crate (out of
    // scope); `platform_token` is carried here only so whatever process
    // embeds the real `PlatformClient` can read it off `Config` rather than
    // re-parsing the environment.
    tracing::debug!(platform_token_configured = !config.platform_token.is_empty(), "platform credential loaded");

    let store = roomrelay_store::create_pool(&config.store.url, config.store.max_connections())
        .await
        .context("failed to connect to store")?;
    roomrelay_store::run_migrations(&store)
        .await
        .context("failed to run store migrations")?;

    let cache = roomrelay_cache::create_pool(&config.cache.url)
        .await
        .context("failed to connect to cache")?;

    let admin_password_hash = roomrelay_core::auth::hash_password(&config.auth.admin_password)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?;

    let state = roomrelay_core::AppState {
        store,
        cache,
        config: roomrelay_core::AppConfig {
            jwt_secret: config.auth.secret_key.clone(),
            jwt_expiry_minutes: config.auth.token_expire_minutes,
            admin_username: config.auth.admin_username.clone(),
            admin_password_hash,
            allowed_origins: config.server.allowed_origins.clone(),
            rate_limit_requests: config.auth.rate_limit_requests,
            rate_limit_window_secs: config.auth.rate_limit_window_secs,
            fanout_per_room_concurrency: config.fanout.per_room_concurrency,
            fanout_retry_max: config.fanout.retry_max,
        },
        metrics: Arc::new(roomrelay_core::RelayMetrics::default()),
        shutdown: Arc::new(tokio::sync::Notify::new()),
    };

    let router = roomrelay_api::build_router(&state.config)
        .merge(roomrelay_ws::live_push_router())
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;

    let shutdown = state.shutdown.clone();
    let shutdown_signal = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down (ctrl-c)");
            }
            _ = shutdown.notified() => {
                tracing::info!("shutting down (internal notify)");
            }
        }
    };

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("server error")?;

    Ok(())
}
