/// Session records and the store contract
///
/// A record is a snapshot of the user taken at login, serialized as JSON
/// under the user's identifier.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::users::User;

/// Snapshot of the user record taken at login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub verified: bool,
    pub logged_in_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            verified: user.verified,
            logged_in_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Server-side sessions keyed by user identifier
///
/// Writes for one key are atomic in the backing cache; concurrent writers
/// for the same user are last-write-wins.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Store `record` under `user_id`, replacing any previous session and its expiry
    async fn put(&self, user_id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), AppError>;

    async fn get(&self, user_id: &str) -> Result<Option<SessionRecord>, AppError>;

    async fn delete(&self, user_id: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_record_json_round_trip_keeps_identity() {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: "user".into(),
            verified: true,
            logged_in_at: Utc::now(),
        };

        let parsed = SessionRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_corrupt_record_is_store_error() {
        assert!(matches!(
            SessionRecord::from_json("{not json"),
            Err(AppError::Store(StoreError::Corrupt(_)))
        ));
    }
}
