use anyhow::{anyhow, Result};
/// JWT token generation and validation using HS256
/// Access tokens: 1-day expiry
/// Refresh tokens: 10-day expiry
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRY_DAYS: i64 = 1;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 10;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    /// Username
    pub username: String,
}

/// Token pair returned on login and refresh
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct Keys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

lazy_static! {
    static ref JWT_KEYS: RwLock<Option<Keys>> = RwLock::new(None);
}

/// Initialize signing keys from the configured secrets. Must be called
/// during application startup before any JWT operation.
pub fn initialize_keys(access_secret: &str, refresh_secret: &str) -> Result<()> {
    let keys = Keys {
        access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
        access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
        refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
        refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
    };

    let mut slot = JWT_KEYS
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock on JWT keys: {}", e))?;
    *slot = Some(keys);

    Ok(())
}

fn with_keys<T>(f: impl FnOnce(&Keys) -> Result<T>) -> Result<T> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {}", e))?;

    match keys.as_ref() {
        Some(keys) => f(keys),
        None => Err(anyhow!(
            "JWT keys not initialized. Call initialize_keys() during startup"
        )),
    }
}

fn generate_token(
    user_id: Uuid,
    username: &str,
    token_type: &str,
    expiry: Duration,
    key: &EncodingKey,
) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + expiry).timestamp(),
        token_type: token_type.to_string(),
        username: username.to_string(),
    };

    encode(&Header::default(), &claims, key)
        .map_err(|e| anyhow!("Failed to generate {} token: {}", token_type, e))
}

/// Generate a new access token
pub fn generate_access_token(user_id: Uuid, username: &str) -> Result<String> {
    with_keys(|keys| {
        generate_token(
            user_id,
            username,
            "access",
            Duration::days(ACCESS_TOKEN_EXPIRY_DAYS),
            &keys.access_encoding,
        )
    })
}

/// Generate a new refresh token
pub fn generate_refresh_token(user_id: Uuid, username: &str) -> Result<String> {
    with_keys(|keys| {
        generate_token(
            user_id,
            username,
            "refresh",
            Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
            &keys.refresh_encoding,
        )
    })
}

/// Generate both tokens for a user
pub fn generate_token_pair(user_id: Uuid, username: &str) -> Result<TokenPair> {
    Ok(TokenPair {
        access_token: generate_access_token(user_id, username)?,
        refresh_token: generate_refresh_token(user_id, username)?,
    })
}

fn validate(token: &str, expected_type: &str, key: &DecodingKey) -> Result<TokenData<Claims>> {
    let data = decode::<Claims>(token, key, &Validation::default())
        .map_err(|e| anyhow!("Token validation failed: {}", e))?;

    if data.claims.token_type != expected_type {
        return Err(anyhow!(
            "Expected {} token, got {}",
            expected_type,
            data.claims.token_type
        ));
    }

    Ok(data)
}

/// Validate an access token and return its claims
pub fn validate_access_token(token: &str) -> Result<TokenData<Claims>> {
    with_keys(|keys| validate(token, "access", &keys.access_decoding))
}

/// Validate a refresh token and return its claims
pub fn validate_refresh_token(token: &str) -> Result<TokenData<Claims>> {
    with_keys(|keys| validate(token, "refresh", &keys.refresh_decoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        initialize_keys("test-access-secret", "test-refresh-secret").unwrap();
    }

    #[test]
    fn access_token_round_trips() {
        init();
        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id, "tester").unwrap();
        let data = validate_access_token(&token).unwrap();
        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.username, "tester");
        assert_eq!(data.claims.token_type, "access");
    }

    #[test]
    fn refresh_token_is_rejected_as_access() {
        init();
        let token = generate_refresh_token(Uuid::new_v4(), "tester").unwrap();
        assert!(validate_access_token(&token).is_err());
        assert!(validate_refresh_token(&token).is_ok());
    }

    #[test]
    fn garbage_token_fails_validation() {
        init();
        assert!(validate_access_token("not.a.jwt").is_err());
    }
}
