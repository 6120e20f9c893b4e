use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use roomrelay_core::AppState;

/// The single admin principal this deployment issues tokens for. There is
/// no per-user model: every mutating route requires this extractor, which
/// validates the bearer JWT and then confirms a live, non-revoked session
/// record still exists in the Cache.
pub struct AdminUser {
    pub username: String,
    pub token_hash: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "invalid authorization format"))?;

        let claims = roomrelay_core::auth::validate_token(token, &state.config.jwt_secret)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid or expired token"))?;

        let token_hash = roomrelay_core::auth::token_hash(token);
        let session = roomrelay_cache::session::get_session(&state.cache, &token_hash)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "cache error"))?
            .ok_or((StatusCode::UNAUTHORIZED, "session expired or revoked"))?;

        if session.username != claims.sub {
            return Err((StatusCode::UNAUTHORIZED, "session does not match token"));
        }

        let over_budget = roomrelay_cache::rate_limiter::check_request_budget(
            &state.cache,
            &claims.sub,
            state.config.rate_limit_requests,
            state.config.rate_limit_window_secs as i64,
        )
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "cache error"))?;
        if over_budget {
            return Err((StatusCode::TOO_MANY_REQUESTS, "rate limited"));
        }

        Ok(AdminUser {
            username: claims.sub,
            token_hash,
        })
    }
}
