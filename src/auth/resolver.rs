/// Request context resolution
///
/// Turns the credentials carried by a request into an authenticated user.
/// Handlers receive an explicit `RequestCredentials` value instead of the
/// raw request, so resolution can be driven from HTTP or from tests alike.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

use crate::auth::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::jwt::{TokenCodec, TokenKind};
use crate::error::{AppError, AuthError, ForbiddenError};
use crate::session::SessionStore;
use crate::users::{Projection, User, UserDirectory};

/// Token candidates extracted from one inbound request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    bearer: Option<String>,
    access_cookie: Option<String>,
    refresh_cookie: Option<String>,
}

impl RequestCredentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_request(req: &HttpRequest) -> Self {
        let bearer = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        let cookie_value = |name: &str| {
            req.cookie(name)
                .map(|c| c.value().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            bearer,
            access_cookie: cookie_value(ACCESS_TOKEN_COOKIE),
            refresh_cookie: cookie_value(REFRESH_TOKEN_COOKIE),
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_access_cookie(mut self, token: impl Into<String>) -> Self {
        self.access_cookie = Some(token.into());
        self
    }

    pub fn with_refresh_cookie(mut self, token: impl Into<String>) -> Self {
        self.refresh_cookie = Some(token.into());
        self
    }

    /// The bearer header wins over the cookie
    pub fn access_token(&self) -> Option<&str> {
        self.bearer.as_deref().or(self.access_cookie.as_deref())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_cookie.as_deref()
    }
}

/// Resolves request credentials to a verified user with a live session
#[derive(Clone)]
pub struct RequestContextResolver {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
}

impl RequestContextResolver {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            codec,
            sessions,
            users,
        }
    }

    /// Resolve the current user
    ///
    /// Returns `Ok(None)` when no access token is presented or it fails
    /// verification.
    ///
    /// # Errors
    /// - `ForbiddenError::SessionExpired` if the token is valid but its session is gone
    /// - `ForbiddenError::UserNoLongerExists` if the user is missing or unverified
    /// - store or directory failures
    pub async fn resolve(&self, credentials: &RequestCredentials) -> Result<Option<User>, AppError> {
        let token = match credentials.access_token() {
            Some(token) => token,
            None => return Ok(None),
        };

        let claims = match self.codec.verify(token, TokenKind::Access) {
            Some(claims) => claims,
            None => return Ok(None),
        };

        let session = self
            .sessions
            .get(&claims.user)
            .await?
            .ok_or(ForbiddenError::SessionExpired)?;

        match self.users.find_by_id(session.id, Projection::Public).await? {
            Some(user) if user.verified => Ok(Some(user)),
            _ => {
                tracing::warn!(user_id = %session.id, "Session refers to a missing or unverified user");
                Err(ForbiddenError::UserNoLongerExists.into())
            }
        }
    }

    /// Like `resolve`, but anonymity is an error
    ///
    /// # Errors
    /// `AuthError::NotLoggedIn` when no user resolves, plus anything `resolve` returns
    pub async fn require_logged_in(&self, credentials: &RequestCredentials) -> Result<User, AppError> {
        self.resolve(credentials)
            .await?
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }
}
