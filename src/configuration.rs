use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT authentication settings
///
/// Loaded once at startup and shared read-only; every token component
/// receives a reference instead of consulting an ambient global.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    /// Shared HS256 signing secret
    pub secret: String,
    /// Access token lifetime in seconds (e.g., 900 for 15 minutes)
    pub access_token_expiry: i64,
    /// Refresh token lifetime in seconds (e.g., 604800 for 7 days)
    pub refresh_token_expiry: i64,
    /// Issuer claim stamped on access tokens
    pub access_issuer: String,
    /// Issuer claim stamped on refresh tokens. Must differ from
    /// `access_issuer`: the issuer pair is what stops an access token
    /// being replayed where a refresh token is expected.
    pub refresh_issuer: String,
    /// Cookie carrying the access token in cookie mode
    pub access_cookie: String,
    /// Cookie carrying the refresh token in cookie mode
    pub refresh_cookie: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    settings.try_deserialize::<Settings>()
}
