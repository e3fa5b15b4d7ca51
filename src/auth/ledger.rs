/// Revocation Ledger
///
/// One row per issued refresh token, keyed by jti. Rows are inserted at
/// issuance and flipped to blacklisted on logout or rotation; they are
/// never deleted, so the table doubles as an audit trail. Absence of a
/// row is treated as not-blacklisted: only an explicit prior entry can
/// deny a token.
///
/// Functions take any `PgExecutor` so rotation can run blacklist + insert
/// inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::auth::claims::TokenKind;
use crate::auth::jwt::decode_token;
use crate::configuration::JwtSettings;
use crate::error::AppError;

/// A ledger row for an issued refresh token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRefreshToken {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub jti: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub blacklisted_at: Option<DateTime<Utc>>,
    pub blacklisted: bool,
    pub ip_address: String,
    pub user_agent: String,
}

/// Record a freshly issued refresh token
///
/// Decodes the token to extract jti and timestamps. Failing to decode is
/// a caller bug (only just-encoded tokens should be passed in) and
/// surfaces as an internal error, never as an auth failure.
pub async fn record(
    executor: impl PgExecutor<'_>,
    config: &JwtSettings,
    user_id: i64,
    refresh_token: &str,
    ip_address: &str,
    user_agent: &str,
) -> Result<(), AppError> {
    let claims = decode_token(TokenKind::Refresh, refresh_token, config).map_err(|e| {
        AppError::Internal(format!("refusing to record undecodable refresh token: {}", e))
    })?;

    let created_at = DateTime::<Utc>::from_timestamp(claims.iat, 0)
        .ok_or_else(|| AppError::Internal("refresh token iat out of range".to_string()))?;
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::Internal("refresh token exp out of range".to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO user_refresh_tokens
            (token, user_id, jti, created_at, expires_at, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(refresh_token)
    .bind(user_id)
    .bind(&claims.jti)
    .bind(created_at)
    .bind(expires_at)
    .bind(ip_address)
    .bind(user_agent)
    .execute(executor)
    .await?;

    tracing::debug!(user_id = user_id, jti = %claims.jti, "refresh token recorded");
    Ok(())
}

/// Mark the record with this jti blacklisted
///
/// Idempotent: the UPDATE is guarded by `blacklisted = false`, so
/// concurrent rotations of the same token collapse to a single logically
/// blacklisted row and a repeat call is a successful no-op. Returns
/// whether this call flipped a record.
pub async fn blacklist_jti(executor: impl PgExecutor<'_>, jti: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE user_refresh_tokens
        SET blacklisted = true, blacklisted_at = $1
        WHERE jti = $2 AND blacklisted = false
        "#,
    )
    .bind(Utc::now())
    .bind(jti)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether this jti has been explicitly blacklisted. No row means no.
pub async fn is_blacklisted(executor: impl PgExecutor<'_>, jti: &str) -> Result<bool, AppError> {
    let blacklisted = sqlx::query_scalar::<_, bool>(
        "SELECT blacklisted FROM user_refresh_tokens WHERE jti = $1",
    )
    .bind(jti)
    .fetch_optional(executor)
    .await?;

    Ok(blacklisted.unwrap_or(false))
}

/// Fetch the ledger row for a jti, if one was ever recorded
pub async fn fetch_by_jti(
    executor: impl PgExecutor<'_>,
    jti: &str,
) -> Result<Option<UserRefreshToken>, AppError> {
    let record = sqlx::query_as::<_, UserRefreshToken>(
        r#"
        SELECT id, token, user_id, jti, created_at, expires_at,
               blacklisted_at, blacklisted, ip_address, user_agent
        FROM user_refresh_tokens
        WHERE jti = $1
        "#,
    )
    .bind(jti)
    .fetch_optional(executor)
    .await?;

    Ok(record)
}
