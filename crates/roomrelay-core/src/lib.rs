pub mod artifact;
pub mod auth;
pub mod content_filter;
pub mod coordinator;
pub mod envelope;
pub mod error;
pub mod fanout;
pub mod formatter;
pub mod platform;
pub mod rate_limiter;
pub mod reply_resolver;
pub mod resolver;

use roomrelay_cache::CachePool;
use roomrelay_store::DbPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared process state, handed to the Admin API, Live Push Hub, and Relay
/// Coordinator alike. Cheaply cloneable: every field is already a pool
/// handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: DbPool,
    pub cache: CachePool,
    pub config: AppConfig,
    pub metrics: Arc<RelayMetrics>,
    pub shutdown: Arc<Notify>,
}

/// Process-wide counters for `live_stats` and `/analytics/live`. Metrics are
/// the one piece of coordinator-wide mutable state permitted outside the
/// per-event RelayArtifact.
#[derive(Default)]
pub struct RelayMetrics {
    pub messages_relayed: AtomicU64,
    pub messages_rejected: AtomicU64,
}

impl RelayMetrics {
    pub fn record_relayed(&self) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry_minutes: u64,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub fanout_per_room_concurrency: usize,
    pub fanout_retry_max: u32,
}
