use futures::StreamExt;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CacheError;
use crate::pool::CachePool;

/// The five channels subscribers may listen on. Every payload is a JSON
/// object; subscribers must deserialize and act idempotently since at-least-once
/// delivery is all the Cache's pub/sub gives us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Invalidate,
    NewMessage,
    SystemNotification,
    RoomUpdate,
    ChannelUpdate,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Invalidate => "invalidate",
            Topic::NewMessage => "new_message",
            Topic::SystemNotification => "system_notification",
            Topic::RoomUpdate => "room_update",
            Topic::ChannelUpdate => "channel_update",
        }
    }
}

pub async fn publish<T: Serialize>(
    cache: &CachePool,
    topic: Topic,
    payload: &T,
) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let raw = serde_json::to_string(payload)?;
    let _: i64 = conn.publish(topic.as_str(), raw).await?;
    Ok(())
}

/// Subscribes to `topic` and returns an owned stream of decoded messages.
/// Malformed payloads are skipped rather than killing the subscription, since
/// one bad publisher should not take every listener down.
pub async fn subscribe<T: DeserializeOwned + Send + 'static>(
    cache: &CachePool,
    topic: Topic,
) -> Result<impl futures::Stream<Item = T>, CacheError> {
    let mut pubsub = cache.pubsub().await?;
    pubsub.subscribe(topic.as_str()).await?;
    let stream = pubsub
        .into_on_message()
        .filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str::<T>(&payload).ok()
        });
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_match_the_documented_channel_names() {
        assert_eq!(Topic::Invalidate.as_str(), "invalidate");
        assert_eq!(Topic::NewMessage.as_str(), "new_message");
        assert_eq!(Topic::SystemNotification.as_str(), "system_notification");
        assert_eq!(Topic::RoomUpdate.as_str(), "room_update");
        assert_eq!(Topic::ChannelUpdate.as_str(), "channel_update");
    }
}
