use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("internal error: {0}")]
    Internal(String),
}

/// Claims for the single admin credential this deployment issues tokens for.
/// There is no multi-user model: `sub` is the admin username itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub is_superuser: bool,
    pub iat: usize,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(username: &str, secret: &str, expiry_secs: u64) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: username.to_string(),
        is_superuser: true,
        iat: now,
        exp: now + expiry_secs as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(e.to_string()))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// SHA-256 hex digest of a bearer token, used as the Cache session key so
/// the raw token is never held at rest.
pub fn token_hash(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_token_produces_valid_jwt() {
        let secret = "my-secret-key";
        let token = create_token("admin", secret, 3600).expect("create token");
        assert!(!token.is_empty());
        let claims = validate_token(&token, secret).expect("validate");
        assert_eq!(claims.sub, "admin");
        assert!(claims.is_superuser);
    }

    #[test]
    fn validate_token_wrong_secret_fails() {
        let token = create_token("admin", "secret-a", 3600).expect("create token");
        let result = validate_token(&token, "secret-b");
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[test]
    fn validate_token_garbage_input_fails() {
        let result = validate_token("not.a.real.token", "secret");
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[test]
    fn token_expiry_is_set_correctly() {
        let secret = "test-secret";
        let token = create_token("admin", secret, 7200).expect("create token");
        let claims = validate_token(&token, secret).expect("validate");
        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn hash_and_verify_password() {
        let password = "my_secure_password";
        let hashed = hash_password(password).expect("hash");
        assert_ne!(hashed, password);
        assert!(verify_password(password, &hashed).expect("verify"));
    }

    #[test]
    fn verify_password_wrong_input_returns_false() {
        let hashed = hash_password("correct_password").expect("hash");
        let result = verify_password("wrong_password", &hashed).expect("verify");
        assert!(!result);
    }

    #[test]
    fn verify_password_invalid_hash_returns_error() {
        let result = verify_password("anything", "not-a-valid-hash");
        assert!(result.is_err());
    }

    #[test]
    fn token_hash_is_deterministic_and_distinguishes_inputs() {
        assert_eq!(token_hash("abc"), token_hash("abc"));
        assert_ne!(token_hash("abc"), token_hash("abd"));
    }
}
