use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use roomrelay_core::auth::AuthError;
use roomrelay_core::error::{CoreError, PolicyRejection};
use roomrelay_store::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("rate limited")]
    RateLimited,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate limited".to_string()),
            ApiError::Internal(err) => {
                tracing::error!("api internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message, "message": message }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound => ApiError::NotFound,
            CoreError::Forbidden => ApiError::Forbidden,
            CoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Policy(PolicyRejection::RateLimited { .. }) => ApiError::RateLimited,
            CoreError::Policy(rejection) => ApiError::Validation(rejection.to_string()),
            CoreError::Store(err) => ApiError::from(err),
            CoreError::Cache(err) => {
                tracing::error!("cache error: {err:#}");
                ApiError::Internal(anyhow::anyhow!("cache error"))
            }
            CoreError::Auth(err) => ApiError::from(err),
            CoreError::Platform(err) => {
                tracing::error!("platform error: {err:#}");
                ApiError::Internal(anyhow::anyhow!("platform error"))
            }
            CoreError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => ApiError::NotFound,
            DbError::NameTaken => ApiError::Conflict("room name already taken".into()),
            DbError::AlreadyBound => ApiError::Conflict("channel already bound to a room".into()),
            DbError::RoomFull => ApiError::Validation("room is at its subscriber limit".into()),
            DbError::RoomInactive => ApiError::Validation("room is not active".into()),
            DbError::GuildBanned => ApiError::Validation("guild is banned".into()),
            DbError::Sqlx(err) => {
                tracing::error!("database error: {err:#}");
                ApiError::Internal(anyhow::anyhow!("database error"))
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::TokenExpired | AuthError::InvalidToken => {
                ApiError::Unauthorized
            }
            AuthError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<roomrelay_cache::CacheError> for ApiError {
    fn from(e: roomrelay_cache::CacheError) -> Self {
        tracing::error!("cache error: {e:#}");
        ApiError::Internal(anyhow::anyhow!("cache error"))
    }
}
