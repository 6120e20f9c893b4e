use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames the dashboard sends over `/ws`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Authenticate { token: String },
    Ping { ts: i64 },
    /// Anything else is accepted and ignored rather than rejected, per the
    /// forward-compatibility rule in the external interface contract.
    #[serde(other)]
    Unknown,
}

/// Frames the Live Push Hub pushes to dashboards. `Deserialize` is needed
/// too: these are published and re-read back off the same Cache pub/sub
/// channel by every `roomrelay-ws` instance subscribed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    AuthenticationSuccess,
    AuthenticationError { reason: String },
    Pong { ts: i64 },
    LiveStats { stats: LiveStats },
    SystemNotification { message: String, severity: String },
    RoomUpdate { room_id: i64, payload: Value },
    ChannelUpdate { room_id: i64, payload: Value },
    NewMessage { room_id: i64, payload: Value },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveStats {
    pub connected_dashboards: i64,
    pub active_rooms: i64,
    pub active_subscriptions: i64,
    pub messages_relayed_last_minute: i64,
    pub messages_rejected_last_minute: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_unknown_type_does_not_error() {
        let parsed: ClientFrame =
            serde_json::from_str(r#"{"type":"voice_state_update","foo":"bar"}"#).unwrap();
        assert!(matches!(parsed, ClientFrame::Unknown));
    }

    #[test]
    fn authenticate_frame_parses() {
        let parsed: ClientFrame =
            serde_json::from_str(r#"{"type":"authenticate","token":"abc"}"#).unwrap();
        match parsed {
            ClientFrame::Authenticate { token } => assert_eq!(token, "abc"),
            _ => panic!("expected authenticate frame"),
        }
    }

    #[test]
    fn server_frame_serializes_with_type_tag() {
        let frame = ServerFrame::Pong { ts: 42 };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "pong");
        assert_eq!(json["ts"], 42);
    }
}
