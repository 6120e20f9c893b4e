pub mod ban;
pub mod inbound_event;
pub mod live_push;
pub mod message_log;
pub mod permissions;
pub mod room;
pub mod subscription;
