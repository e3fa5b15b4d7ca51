/// Authentication Routes
///
/// Thin HTTP rendering over the session issuance flow: the engine
/// returns structured outcomes and the handlers here decide whether
/// tokens travel as body fields, cookies, or both.

use actix_web::cookie::{time::Duration, Cookie};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::claims::TokenKind;
use crate::auth::session::{self, ClientMeta, TokenBundle};
use crate::auth::verifier::{presented_token, require_token};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Login request: `login` matches either username or email
#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

fn auth_cookie(name: &str, value: &str, ttl_seconds: i64) -> Cookie<'static> {
    Cookie::build(name.to_string(), value.to_string())
        .path("/")
        .secure(true)
        .max_age(Duration::seconds(ttl_seconds))
        .finish()
}

/// Render a freshly issued token bundle
///
/// The two output strategies are independent: body mode puts the tokens
/// in the JSON response, cookie mode sets them as secure cookies. The
/// expiry timestamps and uid are always in the body.
fn token_response(
    bundle: &TokenBundle,
    return_token: bool,
    return_cookie: bool,
    config: &JwtSettings,
) -> HttpResponse {
    let mut body = json!({
        "access_expire": bundle.access_expire,
        "refresh_expire": bundle.refresh_expire,
        "uid": bundle.uid,
    });

    if return_token {
        body["access_token"] = json!(bundle.access_token);
        body["refresh_token"] = json!(bundle.refresh_token);
    }

    let mut response = HttpResponse::Ok();

    if return_cookie {
        response.cookie(auth_cookie(
            TokenKind::Access.cookie_name(config),
            &bundle.access_token,
            TokenKind::Access.ttl_seconds(config),
        ));
        response.cookie(auth_cookie(
            TokenKind::Refresh.cookie_name(config),
            &bundle.refresh_token,
            TokenKind::Refresh.ttl_seconds(config),
        ));
    }

    response.json(body)
}

/// POST /auth/login and /auth/login/token
///
/// Body-mode login: tokens are returned as response fields.
pub async fn login_token(
    req: HttpRequest,
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let user = session::authenticate(pool.get_ref(), &form.login, &form.password).await?;
    let meta = ClientMeta::from_request(&req);
    let bundle = session::issue_tokens(pool.get_ref(), jwt_config.get_ref(), &user, &meta).await?;

    Ok(token_response(&bundle, true, false, jwt_config.get_ref()))
}

/// POST /auth/login/cookie
///
/// Cookie-mode login: tokens are set as secure cookies and kept out of
/// the response body.
pub async fn login_cookie(
    req: HttpRequest,
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let user = session::authenticate(pool.get_ref(), &form.login, &form.password).await?;
    let meta = ClientMeta::from_request(&req);
    let bundle = session::issue_tokens(pool.get_ref(), jwt_config.get_ref(), &user, &meta).await?;

    Ok(token_response(&bundle, false, true, jwt_config.get_ref()))
}

/// GET /auth/verify
///
/// Confirms a valid access token (bearer header or cookie) and returns
/// the subject id.
pub async fn verify(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let (user, _claims) =
        require_token(&req, pool.get_ref(), jwt_config.get_ref(), TokenKind::Access).await?;

    Ok(HttpResponse::Ok().json(json!({ "uid": user.id })))
}

/// POST /auth/token/refresh
///
/// Single refresh: a new access token is issued and the presented
/// refresh token stays valid. The new access token is returned in the
/// body and as a cookie, so both client styles can consume it.
pub async fn token_refresh(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_token(&req, TokenKind::Refresh, jwt_config.get_ref())
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    let grant =
        session::refresh_access_token(pool.get_ref(), jwt_config.get_ref(), &presented).await?;

    Ok(HttpResponse::Ok()
        .cookie(auth_cookie(
            TokenKind::Access.cookie_name(jwt_config.get_ref()),
            &grant.access_token,
            TokenKind::Access.ttl_seconds(jwt_config.get_ref()),
        ))
        .json(json!({
            "uid": grant.uid,
            "access_expire": grant.access_expire,
            "access_token": grant.access_token,
        })))
}

/// POST /auth/token/refresh/dual
///
/// Rotation: both tokens are reissued and the old refresh token's jti is
/// blacklisted immediately.
pub async fn dual_token_refresh(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_token(&req, TokenKind::Refresh, jwt_config.get_ref())
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    let meta = ClientMeta::from_request(&req);
    let bundle =
        session::rotate_tokens(pool.get_ref(), jwt_config.get_ref(), &presented, &meta).await?;

    Ok(token_response(&bundle, true, true, jwt_config.get_ref()))
}

/// POST /auth/logout
///
/// Blacklists the presented refresh token and clears both auth cookies.
/// Succeeds even when the token was already blacklisted or never
/// recorded.
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_token(&req, TokenKind::Refresh, jwt_config.get_ref())
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    let uid = session::revoke_session(pool.get_ref(), jwt_config.get_ref(), &presented).await?;

    let mut response = HttpResponse::Ok().json(json!({ "uid": uid }));
    for kind in [TokenKind::Access, TokenKind::Refresh] {
        let mut removal = Cookie::new(kind.cookie_name(jwt_config.get_ref()).to_string(), "");
        removal.set_path("/");
        response
            .add_removal_cookie(&removal)
            .map_err(|e| AppError::Internal(format!("Failed to clear auth cookie: {}", e)))?;
    }

    Ok(response)
}
