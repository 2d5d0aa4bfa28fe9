use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PHOTO: &str = "default.png";
pub const DEFAULT_ROLE: &str = "user";

/// A user record as returned by the directory
///
/// `verified` and `password_hash` are hidden fields: they never appear in
/// serialized output, and the hash is only loaded on request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
    #[serde(skip_serializing, default)]
    pub verified: bool,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Drop the credential so the record can be shared safely
    pub fn without_credentials(mut self) -> Self {
        self.password_hash = None;
        self
    }
}

/// Which hidden fields a lookup should load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Public fields and the verified flag
    Public,
    /// Everything, including the password hash
    WithCredentials,
}

/// A validated signup with an already-hashed password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
