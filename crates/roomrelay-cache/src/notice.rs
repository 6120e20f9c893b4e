use redis::AsyncCommands;

use crate::error::CacheError;
use crate::pool::CachePool;

fn key(room_id: i64, author_id: i64, kind: &str) -> String {
    format!("notice:{room_id}:{author_id}:{kind}")
}

/// Claims the right to send an author a policy-rejection notice for
/// `(room_id, author_id, kind)`. Returns `true` the first time within
/// `window_secs`, `false` on every repeat so the Relay Coordinator can drop
/// a flood of identical rate-limit/policy notices instead of spamming DMs.
pub async fn claim_notice(
    cache: &CachePool,
    room_id: i64,
    author_id: i64,
    kind: &str,
    window_secs: i64,
) -> Result<bool, CacheError> {
    let mut conn = cache.connection();
    let claimed: bool = conn
        .set_nx::<_, _, bool>(key(room_id, author_id, kind), 1)
        .await?;
    if claimed {
        let _: () = conn.expire(key(room_id, author_id, kind), window_secs).await?;
    }
    Ok(claimed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_keys_are_scoped_per_room_author_and_kind() {
        assert_eq!(key(1, 2, "rate_limited"), "notice:1:2:rate_limited");
        assert_ne!(key(1, 2, "rate_limited"), key(1, 2, "too_long"));
    }
}
