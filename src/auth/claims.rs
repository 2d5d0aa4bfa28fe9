/// Token payload and claims
///
/// Both access and refresh tokens carry the same body: the user identifier
/// under `user` plus the standard `iat`/`exp` claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application payload embedded in every token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// User identifier
    pub user: String,
}

impl TokenPayload {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    pub fn for_user(user_id: Uuid) -> Self {
        Self::new(user_id.to_string())
    }
}

/// Signed claims: payload plus timestamps
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub user: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(payload: TokenPayload, expires_in: chrono::Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user: payload.user,
            iat: now,
            exp: now + expires_in.num_seconds(),
        }
    }

    /// Decoded user identifier, `None` when the claim is not a UUID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.user).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = TokenClaims::new(TokenPayload::for_user(user_id), chrono::Duration::minutes(15));

        assert_eq!(claims.user, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.user_id(), Some(user_id));
    }

    #[test]
    fn test_invalid_user_id() {
        let claims = TokenClaims::new(TokenPayload::new("not-a-uuid"), chrono::Duration::minutes(1));
        assert!(claims.user_id().is_none());
        assert_eq!(claims.user, "not-a-uuid");
    }
}
