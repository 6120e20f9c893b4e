use roomrelay_models::message_log::ReplyContext;
use roomrelay_models::permissions::RoomPermissions;
use roomrelay_models::room::Room;
use roomrelay_models::subscription::Subscription;

/// Per-event decision record threaded through the relay pipeline. Built up
/// stage by stage and discarded once fan-out completes; never persisted
/// directly (the Store only ever sees its projection, `MessageLogEntry`).
#[derive(Debug, Clone)]
pub struct RelayArtifact {
    pub source: Subscription,
    pub room: Room,
    pub permissions: RoomPermissions,
    pub author_id: i64,
    pub author_display: String,
    pub source_message_id: i64,
    pub normalized_text: String,
    pub attachment_urls: Vec<String>,
    pub reply_context: Option<ReplyContext>,
    pub envelope_text: Option<String>,
    pub targets: Vec<Subscription>,
}

impl RelayArtifact {
    pub fn new(
        source: Subscription,
        room: Room,
        permissions: RoomPermissions,
        author_id: i64,
        author_display: String,
        source_message_id: i64,
    ) -> Self {
        Self {
            source,
            room,
            permissions,
            author_id,
            author_display,
            source_message_id,
            normalized_text: String::new(),
            attachment_urls: Vec::new(),
            reply_context: None,
            envelope_text: None,
            targets: Vec::new(),
        }
    }
}
