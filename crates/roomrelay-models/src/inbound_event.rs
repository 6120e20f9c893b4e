use serde::{Deserialize, Serialize};

use crate::message_log::AttachmentRef;

/// What the chat-platform gateway SDK hands the Relay Coordinator for every
/// message posted in a channel the relay is watching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundChatEvent {
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub author_id: i64,
    pub author_display: String,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    /// Set when the platform reports this message as a native reply.
    pub reference: Option<MessageReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReference {
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
}

/// A message as fetched back from the platform SDK when resolving a reply
/// reference. Mirrors the subset of platform state the Reply Resolver needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMessage {
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub author_id: i64,
    pub author_display: String,
    pub content: String,
    pub is_bot_author: bool,
    pub reference: Option<MessageReference>,
}
