/// Authentication module
///
/// Token signing and verification, password hashing, session cookies,
/// the authentication flows and request context resolution.

mod claims;
mod cookies;
mod jwt;
mod password;
mod resolver;
mod service;

pub use claims::{TokenClaims, TokenPayload};
pub use cookies::{CookiePolicy, ACCESS_TOKEN_COOKIE, LOGGED_IN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use jwt::{KeyMaterial, TokenCodec, TokenKind};
pub use password::{hash_password, verify_password};
pub use resolver::{RequestContextResolver, RequestCredentials};
pub use service::{AuthService, TokenPair};
