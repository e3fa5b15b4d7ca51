/// Credential Store adapter
///
/// The token engine only needs principal lookup and a password check;
/// user lifecycle (registration, activation, superuser management) is
/// owned elsewhere.

use sqlx::PgPool;

use crate::auth::password::verify_password;
use crate::error::AppError;

/// A principal row. The engine treats it as an opaque lookup result.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl User {
    /// Check a plaintext password against the stored bcrypt hash
    pub fn check_password(&self, password: &str) -> Result<bool, AppError> {
        verify_password(password, &self.password_hash)
    }
}

/// Look up a user by username or email (the login form accepts either)
pub async fn find_by_login_or_email(pool: &PgPool, login: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, name, email, password_hash, is_superuser, is_active
        FROM users
        WHERE username = $1 OR email = $1
        "#,
    )
    .bind(login)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Look up a user by id (token subject resolution)
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, name, email, password_hash, is_superuser, is_active
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
