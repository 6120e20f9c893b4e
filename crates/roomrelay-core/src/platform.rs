use roomrelay_models::inbound_event::PlatformMessage;
use thiserror::Error;

/// Failure returned by a `PlatformClient` call. The Fan-Out Engine (§4.8)
/// classifies these into retry-worthy and terminal buckets; this type keeps
/// that classification at the boundary rather than re-deriving it from a
/// raw status code downstream.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("transient platform failure: {0}")]
    Transient(String),
    #[error("permanent platform failure: {0}")]
    Permanent(String),
}

impl PlatformError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Transient(_))
    }
}

/// Narrow interface onto the out-of-scope chat-platform gateway SDK. The
/// relay pipeline is generic over this trait so every stage that needs the
/// platform (Reply Resolver fetches, Fan-Out Engine sends, author DM
/// notices) can run against an in-memory mock in tests without a real
/// gateway connection.
pub trait PlatformClient: Send + Sync {
    fn fetch_message(
        &self,
        guild_id: i64,
        channel_id: i64,
        message_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<PlatformMessage>, PlatformError>> + Send;

    fn send_message(
        &self,
        channel_id: i64,
        envelope_text: &str,
    ) -> impl std::future::Future<Output = Result<i64, PlatformError>> + Send;

    fn notify_author(
        &self,
        user_id: i64,
        message: &str,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;
}

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the platform SDK. Sent messages and author
    /// notices are recorded for assertions; `fetch_message` answers from a
    /// preloaded table so Reply Resolver tests can simulate a prior post.
    #[derive(Default)]
    pub struct MockPlatformClient {
        pub messages: Mutex<std::collections::HashMap<(i64, i64, i64), PlatformMessage>>,
        pub sent: Mutex<Vec<(i64, String)>>,
        pub notices: Mutex<Vec<(i64, String)>>,
        next_message_id: AtomicI64,
        pub fail_sends_for_channel: Mutex<Option<i64>>,
        /// Remaining transient-failure count per channel; decremented on each
        /// send attempt until it reaches zero, then sends succeed.
        pub transient_failures: Mutex<std::collections::HashMap<i64, u32>>,
    }

    impl MockPlatformClient {
        pub fn new() -> Self {
            Self {
                next_message_id: AtomicI64::new(1),
                ..Default::default()
            }
        }

        pub fn seed_message(&self, guild_id: i64, channel_id: i64, message_id: i64, msg: PlatformMessage) {
            self.messages
                .lock()
                .unwrap()
                .insert((guild_id, channel_id, message_id), msg);
        }
    }

    impl PlatformClient for MockPlatformClient {
        async fn fetch_message(
            &self,
            guild_id: i64,
            channel_id: i64,
            message_id: i64,
        ) -> Result<Option<PlatformMessage>, PlatformError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .get(&(guild_id, channel_id, message_id))
                .cloned())
        }

        async fn send_message(&self, channel_id: i64, envelope_text: &str) -> Result<i64, PlatformError> {
            if *self.fail_sends_for_channel.lock().unwrap() == Some(channel_id) {
                return Err(PlatformError::Permanent("channel deleted".into()));
            }
            {
                let mut remaining = self.transient_failures.lock().unwrap();
                if let Some(count) = remaining.get_mut(&channel_id) {
                    if *count > 0 {
                        *count -= 1;
                        return Err(PlatformError::Transient("upstream rate limited".into()));
                    }
                }
            }
            self.sent
                .lock()
                .unwrap()
                .push((channel_id, envelope_text.to_string()));
            Ok(self.next_message_id.fetch_add(1, Ordering::Relaxed))
        }

        async fn notify_author(&self, user_id: i64, message: &str) -> Result<(), PlatformError> {
            self.notices.lock().unwrap().push((user_id, message.to_string()));
            Ok(())
        }
    }
}
