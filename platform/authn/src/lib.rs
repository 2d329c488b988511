//! Platform authentication helpers: argon2 password hashes and HS256 session tokens.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("JWT secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    #[error("token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    pub ttl_minutes: i64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(secret: impl AsRef<[u8]>, ttl_minutes: i64) -> Result<Self, AuthnError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthnError::WeakSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
            ttl_minutes,
        })
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_token(
    config: &TokenConfig,
    user_id: Uuid,
    email: &str,
) -> Result<IssuedToken, AuthnError> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(Duration::minutes(config.ttl_minutes))
        .unwrap_or(now);
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())?;
    Ok(IssuedToken { token, expires_at })
}

pub fn decode_token(config: &TokenConfig, token: &str) -> Result<Claims, AuthnError> {
    let data =
        jsonwebtoken::decode::<Claims>(token, &config.decoding_key(), &Validation::default())?;
    Ok(data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthnError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthnError::Hash(err.to_string()))
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            TokenConfig::new("too-short", 60),
            Err(AuthnError::WeakSecret)
        ));
    }

    #[test]
    fn token_round_trip_keeps_claims() {
        let config = TokenConfig::new(SECRET, 60).unwrap();
        let user_id = Uuid::new_v4();
        let issued = issue_token(&config, user_id, "ana@example.com").unwrap();
        let claims = decode_token(&config, &issued.token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_other_secret_fails() {
        let config = TokenConfig::new(SECRET, 60).unwrap();
        let other = TokenConfig::new("fedcba9876543210fedcba9876543210", 60).unwrap();
        let issued = issue_token(&other, Uuid::new_v4(), "x@example.com").unwrap();
        assert!(decode_token(&config, &issued.token).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let config = TokenConfig::new(SECRET, -10).unwrap();
        let issued = issue_token(&config, Uuid::new_v4(), "x@example.com").unwrap();
        assert!(decode_token(&config, &issued.token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }
}
