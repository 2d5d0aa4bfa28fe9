/// Authentication service
///
/// Signup, login, access token refresh and logout. A login creates the
/// server-side session; a logout deletes it, which revokes every token
/// issued for that user even before the tokens expire.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::auth::claims::TokenPayload;
use crate::auth::jwt::{TokenCodec, TokenKind};
use crate::auth::password::hash_password;
use crate::auth::resolver::{RequestContextResolver, RequestCredentials};
use crate::configuration::{JwtSettings, SessionSettings};
use crate::error::{AppError, AuthError, DatabaseError, ForbiddenError};
use crate::session::{SessionRecord, SessionStore};
use crate::users::{NewUser, Projection, User, UserDirectory};
use crate::validators::SignupInput;

/// Tokens minted by a successful login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    resolver: RequestContextResolver,
    jwt: JwtSettings,
    session: SessionSettings,
    /// Hash compared against when the email is unknown, at the configured cost
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        jwt: JwtSettings,
        session: SessionSettings,
    ) -> Self {
        let resolver = RequestContextResolver::new(codec.clone(), sessions.clone(), users.clone());
        Self {
            codec,
            sessions,
            users,
            resolver,
            jwt,
            session,
            decoy_hash: OnceCell::new(),
        }
    }

    pub fn resolver(&self) -> &RequestContextResolver {
        &self.resolver
    }

    /// Register a new user
    ///
    /// # Errors
    /// - `AppError::Validation` listing every failing field
    /// - `AppError::DuplicateEmail` if the email is already registered
    #[tracing::instrument(name = "Signing up user", skip(self, input), fields(email = %input.email))]
    pub async fn signup(&self, input: SignupInput) -> Result<User, AppError> {
        let valid = input.validate()?;

        let password_hash = self.hash(valid.password).await?;

        let new_user = NewUser {
            name: valid.name,
            email: valid.email,
            password_hash,
        };

        match self.users.create(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User signed up");
                Ok(user)
            }
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_))) => {
                Err(AppError::DuplicateEmail)
            }
            Err(e) => Err(e),
        }
    }

    /// Authenticate with email and password, open a session and mint both tokens
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` for an unknown email or a wrong
    /// password alike
    #[tracing::instrument(name = "Logging in user", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let email = email.trim().to_lowercase();

        let user = match self.users.find_by_email(&email, Projection::WithCredentials).await? {
            Some(user) => user,
            None => {
                tracing::debug!("Login for unknown email");
                // same bcrypt work as a wrong password
                let decoy = self.decoy_hash().await?;
                self.users.compare_password(password, decoy).await?;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let hashed = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.users.compare_password(password, hashed).await? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = user.without_credentials();
        let session_key = user.id.to_string();
        self.sessions
            .put(&session_key, &SessionRecord::from_user(&user), self.session.ttl())
            .await?;

        let access_token = self.codec.sign(
            TokenPayload::for_user(user.id),
            TokenKind::Access,
            self.jwt.access_token_ttl(),
        )?;
        let refresh_token = self.codec.sign(
            TokenPayload::for_user(user.id),
            TokenKind::Refresh,
            self.jwt.refresh_token_ttl(),
        )?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mint a fresh access token from a refresh token
    ///
    /// The refresh token itself is not rotated, and the session TTL is
    /// not extended.
    ///
    /// # Errors
    /// - `ForbiddenError::RefreshDenied` for a missing or invalid token,
    ///   or a user that is gone or unverified
    /// - `ForbiddenError::UserSessionExpired` if no session exists
    #[tracing::instrument(name = "Refreshing access token", skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: Option<&str>) -> Result<String, AppError> {
        let claims = refresh_token
            .and_then(|token| self.codec.verify(token, TokenKind::Refresh))
            .ok_or(ForbiddenError::RefreshDenied)?;

        let session = self
            .sessions
            .get(&claims.user)
            .await?
            .ok_or(ForbiddenError::UserSessionExpired)?;

        let user = match self.users.find_by_id(session.id, Projection::Public).await? {
            Some(user) if user.verified => user,
            _ => return Err(ForbiddenError::RefreshDenied.into()),
        };

        let access_token = self.codec.sign(
            TokenPayload::for_user(user.id),
            TokenKind::Access,
            self.jwt.access_token_ttl(),
        )?;

        tracing::info!(user_id = %user.id, "Access token refreshed");
        Ok(access_token)
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.session.password_hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn decoy_hash(&self) -> Result<&str, AppError> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hash(uuid::Uuid::new_v4().to_string()))
            .await?;
        Ok(hash.as_str())
    }

    /// Resolve the caller and delete their session
    ///
    /// # Errors
    /// Whatever `RequestContextResolver::require_logged_in` returns
    #[tracing::instrument(name = "Logging out user", skip(self, credentials))]
    pub async fn logout(&self, credentials: &RequestCredentials) -> Result<User, AppError> {
        let user = self.resolver.require_logged_in(credentials).await?;
        self.sessions.delete(&user.id.to_string()).await?;

        tracing::info!(user_id = %user.id, "User logged out");
        Ok(user)
    }
}
