mod auth;
mod health_check;

pub use auth::{dual_token_refresh, login_cookie, login_token, logout, token_refresh, verify};
pub use health_check::health_check;
