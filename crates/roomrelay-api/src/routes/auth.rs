use axum::extract::State;
use axum::Json;
use roomrelay_core::AppState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AdminUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

async fn issue_session(state: &AppState, username: &str) -> Result<LoginResponse, ApiError> {
    let expires_in = state.config.jwt_expiry_minutes * 60;
    let token = roomrelay_core::auth::create_token(username, &state.config.jwt_secret, expires_in)
        .map_err(ApiError::from)?;
    let token_hash = roomrelay_core::auth::token_hash(&token);
    roomrelay_cache::session::put_session(
        &state.cache,
        &token_hash,
        &roomrelay_cache::session::AdminSession {
            username: username.to_string(),
            issued_at: chrono::Utc::now(),
        },
        expires_in,
    )
    .await?;

    Ok(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in,
    })
}

/// The only credential this deployment has: `ADMIN_USERNAME`/`ADMIN_PASSWORD`
/// from the environment, hashed once at startup.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if body.username != state.config.admin_username {
        return Err(ApiError::Unauthorized);
    }
    let valid = roomrelay_core::auth::verify_password(&body.password, &state.config.admin_password_hash)
        .map_err(ApiError::from)?;
    if !valid {
        return Err(ApiError::Unauthorized);
    }

    Ok(Json(issue_session(&state, &body.username).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    roomrelay_cache::session::drop_session(&state.cache, &admin.token_hash).await?;
    Ok(Json(json!({ "status": "logged_out" })))
}

pub async fn refresh(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<LoginResponse>, ApiError> {
    Ok(Json(issue_session(&state, &admin.username).await?))
}

pub async fn me(admin: AdminUser) -> Json<Value> {
    Json(json!({ "username": admin.username }))
}
