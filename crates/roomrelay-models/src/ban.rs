use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GuildBan {
    pub guild_id: i64,
    pub guild_name: String,
    pub reason: String,
    pub banned_by: i64,
    pub banned_at: DateTime<Utc>,
    pub is_active: bool,
    pub unbanned_at: Option<DateTime<Utc>>,
    pub unbanned_by: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BanGuild {
    pub guild_id: i64,
    pub guild_name: String,
    pub reason: String,
}
