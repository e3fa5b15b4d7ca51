/// Session Issuance Flow
///
/// Orchestrates credential check, token pair creation, ledger writes and
/// revocation for login, refresh (single and rotating) and logout. Every
/// verification failure short-circuits before any mutation; ledger
/// writes only happen after the verification they depend on.

use actix_web::http::header;
use actix_web::HttpRequest;
use sqlx::PgPool;

use crate::auth::claims::TokenKind;
use crate::auth::jwt::encode_token;
use crate::auth::ledger;
use crate::auth::verifier::verify_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::users::{self, User};

/// Best-effort client metadata kept on ledger rows for audit
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientMeta {
    pub fn from_request(req: &HttpRequest) -> Self {
        let ip_address = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default();
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            ip_address,
            user_agent,
        }
    }
}

/// A freshly issued access/refresh pair with their expiry timestamps
#[derive(Debug, Clone)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expire: i64,
    pub refresh_expire: i64,
    pub uid: i64,
}

/// A new access token issued against a still-valid refresh token
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: String,
    pub access_expire: i64,
    pub uid: i64,
}

/// Authenticate by login (username or email) and password
///
/// Unknown login and wrong password collapse into the same generic
/// failure, so the response does not reveal which factor was wrong.
pub async fn authenticate(pool: &PgPool, login: &str, password: &str) -> Result<User, AppError> {
    let user = users::find_by_login_or_email(pool, login)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !user.check_password(password)? {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    Ok(user)
}

/// Issue an access/refresh pair for an authenticated user
///
/// The refresh token is recorded in the revocation ledger before the
/// bundle is returned; how the bundle reaches the client (body fields or
/// cookies) is the transport layer's choice.
pub async fn issue_tokens(
    pool: &PgPool,
    config: &JwtSettings,
    user: &User,
    meta: &ClientMeta,
) -> Result<TokenBundle, AppError> {
    let (access_token, access_claims) = encode_token(TokenKind::Access, user.id, config)?;
    let (refresh_token, refresh_claims) = encode_token(TokenKind::Refresh, user.id, config)?;

    ledger::record(
        pool,
        config,
        user.id,
        &refresh_token,
        &meta.ip_address,
        &meta.user_agent,
    )
    .await?;

    tracing::info!(user_id = user.id, jti = %refresh_claims.jti, "session issued");

    Ok(TokenBundle {
        access_token,
        refresh_token,
        access_expire: access_claims.exp,
        refresh_expire: refresh_claims.exp,
        uid: user.id,
    })
}

/// Single refresh: a new access token against an unrotated refresh token
///
/// The presented refresh token must verify and must not be blacklisted;
/// it stays valid afterwards. No ledger mutation happens here.
pub async fn refresh_access_token(
    pool: &PgPool,
    config: &JwtSettings,
    presented: &str,
) -> Result<AccessGrant, AppError> {
    let (user, claims) = verify_token(pool, config, presented, TokenKind::Refresh).await?;

    if ledger::is_blacklisted(pool, &claims.jti).await? {
        tracing::warn!(user_id = user.id, jti = %claims.jti, "blacklisted refresh token presented");
        return Err(AppError::Auth(AuthError::Revoked));
    }

    let (access_token, access_claims) = encode_token(TokenKind::Access, user.id, config)?;

    tracing::info!(user_id = user.id, "access token refreshed");

    Ok(AccessGrant {
        access_token,
        access_expire: access_claims.exp,
        uid: user.id,
    })
}

/// Dual refresh: rotate the refresh token along with the access token
///
/// The old jti is blacklisted and the replacement recorded inside one
/// transaction, so a half-applied rotation cannot leave both tokens
/// usable or neither recorded.
pub async fn rotate_tokens(
    pool: &PgPool,
    config: &JwtSettings,
    presented: &str,
    meta: &ClientMeta,
) -> Result<TokenBundle, AppError> {
    let (user, old_claims) = verify_token(pool, config, presented, TokenKind::Refresh).await?;

    if ledger::is_blacklisted(pool, &old_claims.jti).await? {
        tracing::warn!(user_id = user.id, jti = %old_claims.jti, "blacklisted refresh token presented");
        return Err(AppError::Auth(AuthError::Revoked));
    }

    let (access_token, access_claims) = encode_token(TokenKind::Access, user.id, config)?;
    let (refresh_token, refresh_claims) = encode_token(TokenKind::Refresh, user.id, config)?;

    let mut tx = pool.begin().await?;
    ledger::blacklist_jti(&mut tx, &old_claims.jti).await?;
    ledger::record(
        &mut tx,
        config,
        user.id,
        &refresh_token,
        &meta.ip_address,
        &meta.user_agent,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        user_id = user.id,
        old_jti = %old_claims.jti,
        new_jti = %refresh_claims.jti,
        "refresh token rotated"
    );

    Ok(TokenBundle {
        access_token,
        refresh_token,
        access_expire: access_claims.exp,
        refresh_expire: refresh_claims.exp,
        uid: user.id,
    })
}

/// Logout: blacklist the presented refresh token's jti
///
/// The token must verify (signature, issuer, expiry, known active
/// subject), but its ledger state is deliberately not consulted: logging
/// out with an already-blacklisted or never-recorded token is still a
/// success for the caller.
pub async fn revoke_session(
    pool: &PgPool,
    config: &JwtSettings,
    presented: &str,
) -> Result<i64, AppError> {
    let (user, claims) = verify_token(pool, config, presented, TokenKind::Refresh).await?;

    let flipped = ledger::blacklist_jti(pool, &claims.jti).await?;
    tracing::info!(
        user_id = user.id,
        jti = %claims.jti,
        newly_blacklisted = flipped,
        "session revoked"
    );

    Ok(user.id)
}
