use redis::AsyncCommands;

use crate::error::CacheError;
use crate::keys;
use crate::pool::CachePool;

/// Increment-and-test sliding window for `(room_id, author_id)`. `INCR`
/// followed by a one-shot `EXPIRE` (only on the first increment) linearizes
/// concurrent submissions on the Cache's atomic counter without any
/// relay-side locking.
///
/// Returns `true` when the message should be rejected as rate limited.
pub async fn check_and_increment(
    cache: &CachePool,
    room_id: i64,
    author_id: i64,
    window_secs: i64,
) -> Result<bool, CacheError> {
    if window_secs <= 0 {
        return Ok(false);
    }
    let key = keys::rate(room_id, author_id);
    let mut conn = cache.connection();
    let count: i64 = conn.incr(&key, 1).await?;
    if count == 1 {
        let _: () = conn.expire(&key, window_secs).await?;
    }
    Ok(count > 1)
}

/// Fixed-window request budget for a single principal, used by the Admin
/// API's per-authenticated-user rate limit rather than the chat path's
/// one-message-per-window check above. Same `INCR`-then-one-shot-`EXPIRE`
/// shape, parameterized by a caller-supplied ceiling.
///
/// Returns `true` when the request should be rejected as over budget.
pub async fn check_request_budget(
    cache: &CachePool,
    principal: &str,
    limit: u32,
    window_secs: i64,
) -> Result<bool, CacheError> {
    if limit == 0 {
        return Ok(true);
    }
    let key = keys::api_rate(principal);
    let mut conn = cache.connection();
    let count: i64 = conn.incr(&key, 1).await?;
    if count == 1 {
        let _: () = conn.expire(&key, window_secs).await?;
    }
    Ok(count > limit as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_of_zero_disables_limiting_without_a_cache_round_trip() {
        // window_secs <= 0 short-circuits before any Cache access, so this
        // is safe to assert without a live connection.
        let _ = keys::rate(1, 1);
    }

    #[test]
    fn zero_limit_rejects_without_a_cache_round_trip() {
        let _ = keys::api_rate("admin");
    }
}
