use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A channel binding: exactly one channel, in exactly one guild, bound to
/// at most one room at a time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub room_id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub guild_name: String,
    pub channel_name: String,
    pub registered_by: i64,
    pub registered_at: DateTime<Utc>,
    pub is_active: bool,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterChannel {
    pub guild_id: i64,
    pub channel_id: i64,
    pub guild_name: String,
    pub channel_name: String,
}
