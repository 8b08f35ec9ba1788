use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};

const ISSUER: &str = "academialink";

// In-memory signing secret cache
static JWT_SECRET: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub iss: String, // Issuer
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub jti: String, // JWT ID for uniqueness
}

/// Get the HS256 signing secret
///
/// Uses `ACADEMIALINK_JWT_SECRET` when configured, otherwise a random secret
/// generated once per process (sessions do not survive a restart).
pub fn get_jwt_secret() -> String {
    // Fast path: check cache with read lock
    {
        let cache = JWT_SECRET.read();
        if let Some(secret) = cache.as_ref() {
            return secret.clone();
        }
    }

    let mut cache = JWT_SECRET.write();

    // Double-check: another thread might have initialized while we waited
    if let Some(secret) = cache.as_ref() {
        return secret.clone();
    }

    let secret = match CONFIG.auth.jwt_secret.clone() {
        Some(secret) => secret,
        None => {
            tracing::warn!("ACADEMIALINK_JWT_SECRET not set, generating temporary secret");
            generate_random_string(32)
        }
    };

    *cache = Some(secret.clone());
    secret
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Create a session token for a user
pub fn create_session_token(user_id: i64, expires_in: Option<i64>) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expires_in.unwrap_or(CONFIG.auth.session_ttl_secs));

    let claims = Claims {
        sub: user_id.to_string(),
        iss: ISSUER.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let secret = get_jwt_secret();
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), &claims, &encoding_key).map_err(|e| e.into())
}

/// Decode and validate a session token
pub fn decode_token(token: &str) -> Result<Claims> {
    let secret = get_jwt_secret();
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[ISSUER]);
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

/// Generate a cryptographically secure random string (hex)
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..length).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_session_token_round_trip() {
        let token = create_session_token(42, None).unwrap();
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = create_session_token(42, Some(-60)).unwrap();
        assert!(decode_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = create_session_token(7, None).unwrap();
        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);
        assert!(decode_token(&tampered).is_err());
    }

    #[test]
    fn test_random_string_is_hex_of_requested_bytes() {
        let s = generate_random_string(16);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(s, generate_random_string(16));
    }
}
