use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use session_auth::auth::{AuthService, CookiePolicy, TokenCodec};
use session_auth::configuration::{get_configuration, Settings};
use session_auth::session::RedisSessionStore;
use session_auth::startup::run;
use session_auth::telemetry::init_telemetry;
use session_auth::users::PgUserDirectory;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Keys are parsed before anything binds; a bad key stops the process
    let codec = TokenCodec::from_settings(&configuration.jwt).map_err(|e| {
        tracing::error!("Failed to load signing keys: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Signing key error")
    })?;

    warn_on_lifetime_mismatch(&configuration);

    // An unreachable Redis is not fatal: requests needing a session get 503
    // until the background connect succeeds
    let sessions = Arc::new(RedisSessionStore::new(&configuration.redis).map_err(|e| {
        tracing::error!("Invalid session store configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Session store configuration error")
    })?);
    let _ = sessions.connect_in_background();

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(configuration.database.acquire_timeout_seconds))
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;

    tracing::info!("Database connection pool created successfully");

    let auth = AuthService::new(
        Arc::new(codec),
        sessions.clone(),
        Arc::new(PgUserDirectory::new(pool)),
        configuration.jwt.clone(),
        configuration.session.clone(),
    );
    let cookies = CookiePolicy::from_settings(&configuration.jwt);

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let result = run(listener, auth, cookies)?.await;

    sessions.close().await;
    tracing::info!("Server stopped");

    result
}

/// Tokens outliving their session are rejected early, so say so at startup
fn warn_on_lifetime_mismatch(configuration: &Settings) {
    let access_seconds = configuration.jwt.access_token_ttl().num_seconds();
    let session_seconds = configuration.session.ttl_seconds as i64;

    if access_seconds > session_seconds {
        tracing::warn!(
            access_token_seconds = access_seconds,
            session_ttl_seconds = session_seconds,
            "Access tokens outlive the session TTL and will be rejected before they expire"
        );
    }
}
