use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub max_servers: i64,
    pub is_active: bool,
}

/// `Room` plus the distinct-guild subscription count, as returned by
/// `Store::list_rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomWithChannelCount {
    #[serde(flatten)]
    pub room: Room,
    pub channel_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoom {
    pub name: String,
    pub max_servers: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub max_servers: Option<i64>,
    pub is_active: Option<bool>,
}
