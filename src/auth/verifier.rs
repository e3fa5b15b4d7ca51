/// Token Verifier
///
/// Turns a presented token string into an authenticated principal, or a
/// classified failure. Tokens arrive either as a bearer Authorization
/// header or as the kind's designated cookie; the header wins when both
/// are present.

use actix_web::http::header;
use actix_web::HttpRequest;
use sqlx::PgPool;

use crate::auth::claims::{Claims, TokenKind};
use crate::auth::jwt::decode_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::users::{self, User};

/// Extract the token presented for this kind, if any
///
/// Priority: `Authorization: Bearer ...` header first, then the kind's
/// cookie. A non-Bearer authorization scheme counts as absent.
pub fn presented_token(
    req: &HttpRequest,
    kind: TokenKind,
    config: &JwtSettings,
) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    bearer.or_else(|| {
        req.cookie(kind.cookie_name(config))
            .map(|c| c.value().to_string())
    })
}

/// Verify a presented token of the expected kind and resolve its subject
///
/// Decode failures keep their specific variant internally (the HTTP
/// boundary collapses them to "Invalid token"); a decoded token whose
/// subject no longer exists fails as `UnknownSubject`, and a disabled
/// subject as `InactiveSubject`. The reference implementation built the
/// inactive error without raising it; here inactive users are rejected.
///
/// Returns the principal together with the decoded claims so callers
/// can reach the jti without it being stashed on the user object.
pub async fn verify_token(
    pool: &PgPool,
    config: &JwtSettings,
    token: &str,
    kind: TokenKind,
) -> Result<(User, Claims), AppError> {
    let claims = decode_token(kind, token, config).map_err(|e| {
        tracing::warn!(kind = ?kind, error = %e, "token rejected");
        AppError::Auth(e)
    })?;

    let user = users::find_by_id(pool, claims.uid)
        .await?
        .ok_or_else(|| {
            tracing::warn!(uid = claims.uid, "token subject not found");
            AppError::Auth(AuthError::UnknownSubject)
        })?;

    if !user.is_active {
        tracing::warn!(uid = user.id, "token subject is inactive");
        return Err(AppError::Auth(AuthError::InactiveSubject));
    }

    Ok((user, claims))
}

/// Extract and verify in one step
///
/// When neither header nor cookie carries a token, fails without any
/// principal lookup.
pub async fn require_token(
    req: &HttpRequest,
    pool: &PgPool,
    config: &JwtSettings,
    kind: TokenKind,
) -> Result<(User, Claims), AppError> {
    let token = presented_token(req, kind, config)
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    verify_token(pool, config, &token, kind).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            access_issuer: "boringweb/access".to_string(),
            refresh_issuer: "boringweb/refresh".to_string(),
            access_cookie: "access_token".to_string(),
            refresh_cookie: "refresh_token".to_string(),
        }
    }

    #[test]
    fn bearer_header_is_extracted() {
        let config = get_test_config();
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer sometoken"))
            .to_http_request();

        let token = presented_token(&req, TokenKind::Access, &config);
        assert_eq!(token.as_deref(), Some("sometoken"));
    }

    #[test]
    fn non_bearer_scheme_counts_as_absent() {
        let config = get_test_config();
        let req = TestRequest::default()
            .insert_header(("Authorization", "Token sometoken"))
            .to_http_request();

        assert!(presented_token(&req, TokenKind::Access, &config).is_none());
    }

    #[test]
    fn cookie_is_extracted_for_the_matching_kind() {
        let config = get_test_config();
        let req = TestRequest::default()
            .cookie(Cookie::new("refresh_token", "cookietoken"))
            .to_http_request();

        let token = presented_token(&req, TokenKind::Refresh, &config);
        assert_eq!(token.as_deref(), Some("cookietoken"));

        // The access kind looks at its own cookie only.
        assert!(presented_token(&req, TokenKind::Access, &config).is_none());
    }

    #[test]
    fn header_takes_priority_over_cookie() {
        let config = get_test_config();
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer headertoken"))
            .cookie(Cookie::new("access_token", "cookietoken"))
            .to_http_request();

        let token = presented_token(&req, TokenKind::Access, &config);
        assert_eq!(token.as_deref(), Some("headertoken"));
    }

    #[test]
    fn no_header_no_cookie_is_none() {
        let config = get_test_config();
        let req = TestRequest::default().to_http_request();
        assert!(presented_token(&req, TokenKind::Access, &config).is_none());
    }
}
