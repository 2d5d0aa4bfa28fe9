/// Shared fixtures for unit tests

use std::sync::Arc;

use crate::auth::{AuthService, KeyMaterial, TokenCodec};
use crate::configuration::{JwtSettings, SessionSettings};
use crate::session::InMemorySessionStore;
use crate::users::{InMemoryUserDirectory, User};
use crate::validators::SignupInput;

pub const ACCESS_PRIVATE: &str = include_str!("../tests/fixtures/access_private.pem");
pub const ACCESS_PUBLIC: &str = include_str!("../tests/fixtures/access_public.pem");
pub const REFRESH_PRIVATE: &str = include_str!("../tests/fixtures/refresh_private.pem");
pub const REFRESH_PUBLIC: &str = include_str!("../tests/fixtures/refresh_public.pem");

pub fn test_codec() -> TokenCodec {
    TokenCodec::from_pem(KeyMaterial {
        access_private: ACCESS_PRIVATE.as_bytes(),
        access_public: ACCESS_PUBLIC.as_bytes(),
        refresh_private: REFRESH_PRIVATE.as_bytes(),
        refresh_public: REFRESH_PUBLIC.as_bytes(),
    })
    .expect("Failed to build test codec")
}

/// Token lifetimes in minutes; keys are supplied by `test_codec`
pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        access_token_expires_in: 15,
        refresh_token_expires_in: 60,
        access_private_key: String::new(),
        access_public_key: String::new(),
        refresh_private_key: String::new(),
        refresh_public_key: String::new(),
        secure_cookies: false,
    }
}

/// Cheap bcrypt cost so tests stay fast
pub fn test_session_settings() -> SessionSettings {
    SessionSettings {
        ttl_seconds: 3600,
        password_hash_cost: 4,
    }
}

pub struct Harness {
    pub service: AuthService,
    pub codec: Arc<TokenCodec>,
    pub sessions: Arc<InMemorySessionStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub session: SessionSettings,
}

/// Service over in-memory stores, with a cheap bcrypt cost
pub fn harness() -> Harness {
    let codec = Arc::new(test_codec());
    let sessions = Arc::new(InMemorySessionStore::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let jwt = test_jwt_settings();
    let session = test_session_settings();

    let service = AuthService::new(
        codec.clone(),
        sessions.clone(),
        users.clone(),
        jwt,
        session.clone(),
    );

    Harness {
        service,
        codec,
        sessions,
        users,
        session,
    }
}

/// Sign up a user whose password is `password123`
pub async fn signed_up_user(h: &Harness, email: &str) -> User {
    h.service
        .signup(SignupInput::new("Test User", email, "password123", "password123"))
        .await
        .expect("Failed to sign up test user")
}
