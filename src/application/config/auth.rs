use std::env;

use super::{env_flag, env_parse};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret. A random per-process secret is used when unset.
    pub jwt_secret: Option<String>,
    /// Lifetime of a login session in seconds
    pub session_ttl_secs: i64,
    /// Add `Secure` to the session cookie (enable behind HTTPS)
    pub secure_cookies: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env::var("ACADEMIALINK_JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            session_ttl_secs: env_parse("ACADEMIALINK_SESSION_TTL_SECS", 604800),
            secure_cookies: env_flag("ACADEMIALINK_SECURE_COOKIES"),
        }
    }
}
