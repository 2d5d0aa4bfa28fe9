use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
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

/// Session cache connection settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Attempts made by `open()` before giving up
    #[serde(default = "default_connect_attempts")]
    pub max_connect_attempts: u32,
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
    /// Per-command deadline, also bounds each reconnect attempt
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            max_connect_attempts: default_connect_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
            response_timeout_ms: default_response_timeout(),
        }
    }
}

/// Token lifetimes and key material
///
/// Lifetimes are in minutes. Keys are base64-encoded PEM documents.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct JwtSettings {
    pub access_token_expires_in: i64,
    pub refresh_token_expires_in: i64,
    #[serde(default)]
    pub access_private_key: String,
    #[serde(default)]
    pub access_public_key: String,
    #[serde(default)]
    pub refresh_private_key: String,
    #[serde(default)]
    pub refresh_public_key: String,
    /// Marks token cookies `Secure`; only disable for plain-http local development
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

impl JwtSettings {
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expires_in)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.refresh_token_expires_in)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_hash_cost")]
    pub password_hash_cost: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
            password_hash_cost: default_hash_cost(),
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_seconds)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "session:".to_string()
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_retry_max_delay() -> u64 {
    5000
}

fn default_response_timeout() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_hash_cost() -> u32 {
    12
}

/// Conventional environment variables carrying the base64 PEM keys
const KEY_VARIABLES: [(&str, &str); 4] = [
    ("jwt.access_private_key", "JWT_ACCESS_PRIVATE_KEY"),
    ("jwt.access_public_key", "JWT_ACCESS_PUBLIC_KEY"),
    ("jwt.refresh_private_key", "JWT_REFRESH_PRIVATE_KEY"),
    ("jwt.refresh_public_key", "JWT_REFRESH_PUBLIC_KEY"),
];

/// Load settings from `configuration.{yaml,toml,json}` and the environment
///
/// `APP_JWT__ACCESS_TOKEN_EXPIRES_IN=15` overrides `jwt.access_token_expires_in`.
/// The signing keys are also read from `JWT_ACCESS_PRIVATE_KEY` and friends.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    for (key, variable) in KEY_VARIABLES {
        if let Ok(value) = std::env::var(variable) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()?.try_deserialize::<Settings>()
}
