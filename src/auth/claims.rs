/// Token claims and token kinds
///
/// The claim set is identical for both token kinds; the `iss` value is
/// what tells them apart (RFC 7519 issuer binding).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configuration::JwtSettings;

/// JWT claim set. Every field is required: a token missing any of them
/// fails decoding even when the signature is valid.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the authenticated user's id
    pub uid: i64,
    /// Unique token id, fresh per encode; revocation key for refresh tokens
    pub jti: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
    /// Kind-specific issuer
    pub iss: String,
}

impl Claims {
    /// Build a fresh claim set for `uid` with the kind's TTL and issuer.
    /// The jti is a random 128-bit uuid in hex form.
    pub fn new(kind: TokenKind, uid: i64, config: &JwtSettings) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            uid,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now,
            exp: now + kind.ttl_seconds(config),
            iss: kind.issuer(config).to_string(),
        }
    }
}

/// The two token kinds issued by this service
///
/// Kind-specific constants (TTL, issuer, cookie name) live in
/// `JwtSettings` and are resolved through this enum, so codec and
/// verifier take the kind as an explicit argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn issuer<'a>(&self, config: &'a JwtSettings) -> &'a str {
        match self {
            TokenKind::Access => &config.access_issuer,
            TokenKind::Refresh => &config.refresh_issuer,
        }
    }

    pub fn ttl_seconds(&self, config: &JwtSettings) -> i64 {
        match self {
            TokenKind::Access => config.access_token_expiry,
            TokenKind::Refresh => config.refresh_token_expiry,
        }
    }

    pub fn cookie_name<'a>(&self, config: &'a JwtSettings) -> &'a str {
        match self {
            TokenKind::Access => &config.access_cookie,
            TokenKind::Refresh => &config.refresh_cookie,
        }
    }
}
