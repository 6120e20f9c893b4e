use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lazy reference to an attachment — the relay never downloads or stores
/// attachment bytes, only enough to rebuild a link in the target channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOriginKind {
    /// The reply targets a message that was never relayed.
    Native,
    /// The reply targets a message this relay itself posted.
    Relayed,
    /// The reply targets a relayed message that was itself a reply; nesting
    /// was capped at one level.
    RelayedNested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyContext {
    pub author_display: String,
    pub quoted_text: String,
    pub origin_kind: ReplyOriginKind,
}

/// Immutable, append-only record of a successfully processed inbound event.
/// Written once the Fan-Out Engine finishes, whether or not any deliveries
/// succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: i64,
    pub room_id: i64,
    pub source_guild_id: i64,
    pub source_channel_id: i64,
    pub source_message_id: i64,
    pub author_id: i64,
    pub author_display: String,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub reply_to: Option<ReplyContext>,
    pub timestamp: DateTime<Utc>,
    pub delivered_count: i64,
    pub failed_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewMessageLogEntry {
    pub id: i64,
    pub room_id: i64,
    pub source_guild_id: i64,
    pub source_channel_id: i64,
    pub source_message_id: i64,
    pub author_id: i64,
    pub author_display: String,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub reply_to: Option<ReplyContext>,
    pub delivered_count: i64,
    pub failed_count: i64,
}
