/// Application Error Handling
///
/// Central error types for the authentication engine. Auth failures are
/// classified precisely on the inside (for diagnostics) but deliberately
/// collapsed to a small set of generic messages at the HTTP boundary so
/// the response cannot be used as a token-probing oracle.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Authentication and token verification errors
///
/// The token subtypes (`TokenInvalid`, `TokenExpired`, `IssuerMismatch`,
/// `MissingClaim`, `MissingToken`, `Revoked`) all render as the same
/// "Invalid token" message to callers; only logs keep the distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown login or wrong password; the two cases are not distinguished
    InvalidCredentials,
    /// No token presented via header or cookie
    MissingToken,
    /// Signature, structure, or algorithm failure
    TokenInvalid,
    /// `exp` is in the past
    TokenExpired,
    /// Correctly signed token of the wrong kind
    IssuerMismatch,
    /// A required claim is absent despite a valid signature
    MissingClaim(String),
    /// Refresh token jti is blacklisted in the ledger
    Revoked,
    /// Decoded token references a principal that no longer exists
    UnknownSubject,
    /// Principal exists but is disabled
    InactiveSubject,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::MissingToken => write!(f, "no token presented"),
            AuthError::TokenInvalid => write!(f, "token failed verification"),
            AuthError::TokenExpired => write!(f, "token has expired"),
            AuthError::IssuerMismatch => write!(f, "token issuer does not match expected kind"),
            AuthError::MissingClaim(claim) => write!(f, "token is missing claim: {}", claim),
            AuthError::Revoked => write!(f, "token has been revoked"),
            AuthError::UnknownSubject => write!(f, "token subject does not exist"),
            AuthError::InactiveSubject => write!(f, "token subject is not active"),
        }
    }
}

impl StdError for AuthError {}

impl AuthError {
    /// The caller-visible message. Token subtypes collapse to one generic
    /// string by design.
    pub fn public_detail(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::UnknownSubject => "Wrong user credentials",
            AuthError::InactiveSubject => "User is not active",
            AuthError::MissingToken
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::IssuerMismatch
            | AuthError::MissingClaim(_)
            | AuthError::Revoked => "Invalid token",
        }
    }
}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Database(DatabaseError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("no rows") {
            AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Database(DatabaseError::ConnectionPool(error_msg))
        } else {
            AppError::Database(DatabaseError::UnexpectedError(error_msg))
        }
    }
}

/// Error body rendered at the HTTP boundary, matching the reference
/// API's `{"detail": ...}` shape.
#[derive(Debug, serde::Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Every auth outcome is a flat 403; distinguishing them by
            // status would leak what the message hides.
            AppError::Auth(_) => StatusCode::FORBIDDEN,
            AppError::Database(DatabaseError::ConnectionPool(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            AppError::Auth(e) => {
                tracing::warn!(error = %e, "authentication failure");
                e.public_detail().to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorDetail { detail })
    }
}
