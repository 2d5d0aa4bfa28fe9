use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::verify_password;
use crate::error::AppError;
use crate::users::model::{NewUser, Projection, User};

/// Persistent user records
///
/// Implementations report a duplicate email from `create` as
/// `DatabaseError::UniqueConstraintViolation`.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Emails are matched case-insensitively
    async fn find_by_email(&self, email: &str, projection: Projection)
        -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid, projection: Projection) -> Result<Option<User>, AppError>;

    /// Compare a candidate password with a stored hash off the async executor
    async fn compare_password(&self, candidate: &str, hashed: &str) -> Result<bool, AppError> {
        let candidate = candidate.to_string();
        let hashed = hashed.to_string();
        tokio::task::spawn_blocking(move || verify_password(&candidate, &hashed))
            .await
            .map_err(|e| AppError::Internal(format!("Password comparison task failed: {}", e)))
    }
}
