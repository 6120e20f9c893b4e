//! Key-space for the Cache, as enumerated by the external interface
//! contract's TTL table. Centralized here so the Resolver, Admin API, and
//! rate limiter never hand-format a key independently.

pub fn room(room_id: i64) -> String {
    format!("room:{room_id}")
}

pub const ROOM_TTL_SECS: u64 = 3600;

pub fn perms(room_id: i64) -> String {
    format!("perms:{room_id}")
}

pub const PERMS_TTL_SECS: u64 = 1800;

pub fn chan(guild_id: i64, channel_id: i64) -> String {
    format!("chan:{guild_id}:{channel_id}")
}

pub const CHAN_TTL_SECS: u64 = 7200;

/// The sentinel value stored at a `chan:` key to record "looked up, not
/// subscribed" without a round-trip to Store.
pub const TOMBSTONE: &str = "\0tombstone";

pub const TOMBSTONE_TTL_SECS: u64 = 300;

pub fn rate(room_id: i64, user_id: i64) -> String {
    format!("rate:{room_id}:{user_id}")
}

pub const LIVE_STATS_KEY: &str = "live_stats";
pub const LIVE_STATS_TTL_SECS: u64 = 60;

pub fn session(token_hash: &str) -> String {
    format!("session:{token_hash}")
}

pub fn api_rate(principal: &str) -> String {
    format!("apirate:{principal}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_purpose() {
        assert_eq!(room(1), "room:1");
        assert_eq!(perms(1), "perms:1");
        assert_eq!(chan(10, 20), "chan:10:20");
        assert_eq!(rate(1, 5), "rate:1:5");
        assert_eq!(session("abc"), "session:abc");
        assert_eq!(api_rate("admin"), "apirate:admin");
    }
}
