use std::net::TcpListener;
use std::sync::Arc;

use session_auth::auth::{AuthService, CookiePolicy, KeyMaterial, TokenCodec};
use session_auth::configuration::{JwtSettings, SessionSettings};
use session_auth::session::InMemorySessionStore;
use session_auth::startup::run;
use session_auth::users::InMemoryUserDirectory;

pub struct TestApp {
    pub address: String,
    pub sessions: Arc<InMemorySessionStore>,
    pub users: Arc<InMemoryUserDirectory>,
}

fn test_codec() -> TokenCodec {
    TokenCodec::from_pem(KeyMaterial {
        access_private: include_bytes!("../fixtures/access_private.pem"),
        access_public: include_bytes!("../fixtures/access_public.pem"),
        refresh_private: include_bytes!("../fixtures/refresh_private.pem"),
        refresh_public: include_bytes!("../fixtures/refresh_public.pem"),
    })
    .expect("Failed to load fixture keys")
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt = JwtSettings {
        access_token_expires_in: 15,
        refresh_token_expires_in: 60,
        access_private_key: String::new(),
        access_public_key: String::new(),
        refresh_private_key: String::new(),
        refresh_public_key: String::new(),
        // the test server speaks plain http
        secure_cookies: false,
    };
    let session = SessionSettings {
        ttl_seconds: 3600,
        password_hash_cost: 4,
    };

    let sessions = Arc::new(InMemorySessionStore::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let auth = AuthService::new(
        Arc::new(test_codec()),
        sessions.clone(),
        users.clone(),
        jwt.clone(),
        session,
    );

    let server = run(listener, auth, CookiePolicy::from_settings(&jwt)).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        sessions,
        users,
    }
}
