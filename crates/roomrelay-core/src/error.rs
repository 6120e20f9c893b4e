use thiserror::Error;

/// Policy rejections the Content Filter, Rate Limiter, and Resolver can
/// produce for a single inbound message. These are expected outcomes, not
/// bugs: they are dropped or surfaced to the author as an ephemeral notice,
/// never logged as delivery failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error("channel is not subscribed to any room")]
    NotSubscribed,
    #[error("guild is banned")]
    GuildBanned,
    #[error("room is inactive")]
    RoomInactive,
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },
    #[error("message exceeds the room's maximum length")]
    TooLong,
    #[error("urls are not allowed in this room")]
    UrlsDisallowed,
    #[error("attachments are not allowed in this room")]
    AttachmentsDisallowed,
    #[error("message contains a banned word")]
    BannedWord,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Policy(#[from] PolicyRejection),
    #[error("store error: {0}")]
    Store(#[from] roomrelay_store::DbError),
    #[error("cache error: {0}")]
    Cache(#[from] roomrelay_cache::CacheError),
    #[error("auth error: {0}")]
    Auth(#[from] crate::auth::AuthError),
    #[error("platform error: {0}")]
    Platform(#[from] crate::platform::PlatformError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<roomrelay_store::DbError> for PolicyRejection {
    /// Maps the subset of Store failures that are themselves policy
    /// rejections rather than infrastructure errors, so resolver callers
    /// can match on a single enum.
    fn from(err: roomrelay_store::DbError) -> Self {
        match err {
            roomrelay_store::DbError::RoomInactive => PolicyRejection::RoomInactive,
            roomrelay_store::DbError::GuildBanned => PolicyRejection::GuildBanned,
            _ => PolicyRejection::NotSubscribed,
        }
    }
}
