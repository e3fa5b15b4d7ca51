/// Token Codec
///
/// Encodes and decodes the signed claim-bearing tokens for both token
/// kinds. The algorithm is pinned to HS256 with zero leeway: anything
/// else in the header (including "none") fails verification, a wrong
/// issuer is rejected as a cross-kind substitution attempt, and every
/// claim in `Claims` is mandatory regardless of signature validity.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Generate a signed token of the given kind for a user
///
/// Stamps a fresh 128-bit jti, `iat = now` and `exp = now + TTL(kind)`.
/// Returns the compact encoded string together with the claims that went
/// into it, so callers can reuse the exact timestamps without re-decoding.
///
/// # Errors
/// Returns an internal error if signing fails
pub fn encode_token(
    kind: TokenKind,
    uid: i64,
    config: &JwtSettings,
) -> Result<(String, Claims), AppError> {
    let claims = Claims::new(kind, uid, config);

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok((token, claims))
}

/// Decode and verify a token of the expected kind against the system clock
///
/// See [`decode_token_at`] for the verification rules.
pub fn decode_token(
    kind: TokenKind,
    token: &str,
    config: &JwtSettings,
) -> Result<Claims, AuthError> {
    decode_token_at(kind, token, config, chrono::Utc::now().timestamp())
}

/// Decode and verify a token of the expected kind at a given instant
///
/// Signature and algorithm are checked first, then claim presence and
/// issuer; expiry is checked last against the supplied `now`, so expiry
/// edge cases are testable without mocking the system clock. The
/// returned error keeps the specific failure for logging; the HTTP
/// boundary collapses it later.
///
/// Expiry boundary: leeway is zero and a token is rejected once `exp` is
/// in the past. A token whose `exp` equals `now` is still accepted; it
/// is expired one second later.
///
/// # Errors
/// * `IssuerMismatch` - correctly signed token of the other kind
/// * `TokenExpired` - `exp` before `now`
/// * `MissingClaim` - required claim absent despite a valid signature
/// * `TokenInvalid` - signature, structure, or algorithm failure
pub fn decode_token_at(
    kind: TokenKind,
    token: &str,
    config: &JwtSettings,
    now: i64,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    // Expiry is enforced below against the caller's clock.
    validation.validate_exp = false;
    validation.set_issuer(&[kind.issuer(config)]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(classify)?;

    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Map jsonwebtoken failures onto the internal taxonomy.
fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
        ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
        // Serde surfaces absent non-optional fields as "missing field `x`";
        // any other JSON failure is plain structural invalidity.
        ErrorKind::Json(json_err) => {
            let msg = json_err.to_string();
            match msg.split('`').nth(1) {
                Some(field) if msg.contains("missing field") => {
                    AuthError::MissingClaim(field.to_string())
                }
                _ => AuthError::TokenInvalid,
            }
        }
        _ => AuthError::TokenInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::json;

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

    /// Sign an arbitrary claim payload with the test secret.
    fn sign_raw(payload: serde_json::Value, algorithm: Algorithm, config: &JwtSettings) -> String {
        encode(
            &Header::new(algorithm),
            &payload,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("failed to sign test token")
    }

    #[test]
    fn round_trip_access_token() {
        let config = get_test_config();
        let (token, issued) = encode_token(TokenKind::Access, 1, &config).unwrap();
        let decoded = decode_token(TokenKind::Access, &token, &config).unwrap();

        assert_eq!(decoded.uid, 1);
        assert_eq!(decoded.iss, config.access_issuer);
        assert_eq!(decoded.jti, issued.jti);
        assert_eq!(decoded.exp, decoded.iat + config.access_token_expiry);
    }

    #[test]
    fn round_trip_refresh_token() {
        let config = get_test_config();
        let (token, _) = encode_token(TokenKind::Refresh, 42, &config).unwrap();
        let decoded = decode_token(TokenKind::Refresh, &token, &config).unwrap();

        assert_eq!(decoded.uid, 42);
        assert_eq!(decoded.iss, config.refresh_issuer);
        assert_eq!(decoded.exp, decoded.iat + config.refresh_token_expiry);
    }

    #[test]
    fn access_token_is_rejected_where_refresh_is_expected() {
        let config = get_test_config();
        let (token, _) = encode_token(TokenKind::Access, 1, &config).unwrap();

        let result = decode_token(TokenKind::Refresh, &token, &config);
        assert_eq!(result.unwrap_err(), AuthError::IssuerMismatch);
    }

    #[test]
    fn refresh_token_is_rejected_where_access_is_expected() {
        let config = get_test_config();
        let (token, _) = encode_token(TokenKind::Refresh, 1, &config).unwrap();

        let result = decode_token(TokenKind::Access, &token, &config);
        assert_eq!(result.unwrap_err(), AuthError::IssuerMismatch);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = get_test_config();
        let (token, _) = encode_token(TokenKind::Access, 1, &config).unwrap();

        let tampered = format!("{}X", token);
        let result = decode_token(TokenKind::Access, &tampered, &config);
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = get_test_config();
        let result = decode_token(TokenKind::Access, "wrong token", &config);
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn unsigned_token_never_decodes() {
        let config = get_test_config();
        let now = chrono::Utc::now().timestamp();

        // Hand-built compact form with alg "none" and an empty signature.
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "uid": 1,
                "jti": "deadbeefdeadbeefdeadbeefdeadbeef",
                "iat": now,
                "exp": now + 60,
                "iss": config.access_issuer,
            })
            .to_string(),
        );
        let token = format!("{}.{}.", header, payload);

        let result = decode_token(TokenKind::Access, &token, &config);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_algorithm_is_rejected() {
        let config = get_test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign_raw(
            json!({
                "uid": 1,
                "jti": "deadbeefdeadbeefdeadbeefdeadbeef",
                "iat": now,
                "exp": now + 60,
                "iss": config.access_issuer,
            }),
            Algorithm::HS512,
            &config,
        );

        let result = decode_token(TokenKind::Access, &token, &config);
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn missing_claims_fail_despite_valid_signature() {
        let config = get_test_config();
        let token = sign_raw(json!({"uid": 1}), Algorithm::HS256, &config);

        let result = decode_token(TokenKind::Access, &token, &config);
        assert!(matches!(
            result.unwrap_err(),
            AuthError::MissingClaim(_) | AuthError::TokenInvalid
        ));
    }

    #[test]
    fn missing_jti_fails_despite_valid_signature() {
        let config = get_test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign_raw(
            json!({
                "uid": 1,
                "iat": now,
                "exp": now + 60,
                "iss": config.access_issuer,
            }),
            Algorithm::HS256,
            &config,
        );

        let result = decode_token(TokenKind::Access, &token, &config);
        assert_eq!(
            result.unwrap_err(),
            AuthError::MissingClaim("jti".to_string())
        );
    }

    #[test]
    fn token_expired_one_second_ago_is_rejected() {
        let config = get_test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign_raw(
            json!({
                "uid": 1,
                "jti": "deadbeefdeadbeefdeadbeefdeadbeef",
                "iat": now - 60,
                "exp": now - 1,
                "iss": config.access_issuer,
            }),
            Algorithm::HS256,
            &config,
        );

        let result = decode_token(TokenKind::Access, &token, &config);
        assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn token_expiring_exactly_now_is_still_accepted() {
        let config = get_test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign_raw(
            json!({
                "uid": 1,
                "jti": "deadbeefdeadbeefdeadbeefdeadbeef",
                "iat": now - 60,
                "exp": now,
                "iss": config.access_issuer,
            }),
            Algorithm::HS256,
            &config,
        );

        // At the exact boundary the token is still good...
        let decoded = decode_token_at(TokenKind::Access, &token, &config, now).unwrap();
        assert_eq!(decoded.exp, now);

        // ...and one second later it is expired.
        let result = decode_token_at(TokenKind::Access, &token, &config, now + 1);
        assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn token_expiring_in_the_future_is_accepted() {
        let config = get_test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign_raw(
            json!({
                "uid": 1,
                "jti": "deadbeefdeadbeefdeadbeefdeadbeef",
                "iat": now - 60,
                "exp": now + 60,
                "iss": config.access_issuer,
            }),
            Algorithm::HS256,
            &config,
        );

        let decoded = decode_token(TokenKind::Access, &token, &config).unwrap();
        assert_eq!(decoded.uid, 1);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let config = get_test_config();
        let mut other = get_test_config();
        other.secret = "a-completely-different-signing-secret!!".to_string();

        let (token, _) = encode_token(TokenKind::Access, 1, &other).unwrap();
        let result = decode_token(TokenKind::Access, &token, &config);
        assert_eq!(result.unwrap_err(), AuthError::TokenInvalid);
    }
}
