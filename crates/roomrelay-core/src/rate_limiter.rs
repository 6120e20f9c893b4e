use roomrelay_cache::CachePool;

use crate::error::{CoreError, PolicyRejection};

/// Wraps the Cache's atomic sliding-window primitive and turns a hit into
/// the pipeline's `RateLimited` rejection. `window_secs` is the room's
/// `rate_limit_seconds`; 0 disables the check entirely. A Cache failure is
/// an infrastructure error, not a policy outcome, so it stays a `CoreError`
/// rather than being folded into `PolicyRejection`.
pub async fn check(
    cache: &CachePool,
    room_id: i64,
    author_id: i64,
    window_secs: i64,
) -> Result<(), CoreError> {
    let limited =
        roomrelay_cache::rate_limiter::check_and_increment(cache, room_id, author_id, window_secs)
            .await?;
    if limited {
        return Err(PolicyRejection::RateLimited {
            retry_after_secs: window_secs,
        }
        .into());
    }
    Ok(())
}
