/// In-memory user directory for tests and local development

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, DatabaseError};
use crate::users::directory::UserDirectory;
use crate::users::model::{NewUser, Projection, User, DEFAULT_PHOTO, DEFAULT_ROLE};

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the verified flag, returning false if the user is unknown
    pub async fn set_verified(&self, id: Uuid, verified: bool) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.verified = verified;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Remove a user record entirely
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

fn project(user: &User, projection: Projection) -> User {
    match projection {
        Projection::WithCredentials => user.clone(),
        Projection::Public => user.clone().without_credentials(),
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let email = new_user.email.to_lowercase();
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "email {} already registered",
                email
            ))
            .into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email,
            photo: DEFAULT_PHOTO.to_string(),
            role: DEFAULT_ROLE.to_string(),
            verified: true,
            password_hash: Some(new_user.password_hash),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user.without_credentials())
    }

    async fn find_by_email(
        &self,
        email: &str,
        projection: Projection,
    ) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email == email)
            .map(|u| project(u, projection)))
    }

    async fn find_by_id(&self, id: Uuid, projection: Projection) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).map(|u| project(u, projection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let directory = InMemoryUserDirectory::new();
        let user = directory.create(new_user("Test@Example.com")).await.unwrap();

        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.role, DEFAULT_ROLE);
        assert_eq!(user.photo, DEFAULT_PHOTO);
        assert!(user.verified);
        assert!(user.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let directory = InMemoryUserDirectory::new();
        directory.create(new_user("a@x.com")).await.unwrap();

        let result = directory.create(new_user("A@X.com")).await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));
    }

    #[tokio::test]
    async fn test_projection_controls_credentials() {
        let directory = InMemoryUserDirectory::new();
        let created = directory.create(new_user("a@x.com")).await.unwrap();

        let public = directory
            .find_by_email("a@x.com", Projection::Public)
            .await
            .unwrap()
            .unwrap();
        assert!(public.password_hash.is_none());

        let full = directory
            .find_by_id(created.id, Projection::WithCredentials)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(full.password_hash.as_deref(), Some("$2b$04$placeholder"));
    }

    #[tokio::test]
    async fn test_set_verified_and_remove() {
        let directory = InMemoryUserDirectory::new();
        let created = directory.create(new_user("a@x.com")).await.unwrap();

        assert!(directory.set_verified(created.id, false).await);
        let user = directory.find_by_id(created.id, Projection::Public).await.unwrap().unwrap();
        assert!(!user.verified);

        assert!(directory.remove(created.id).await.is_some());
        assert!(directory.find_by_id(created.id, Projection::Public).await.unwrap().is_none());
        assert!(!directory.set_verified(created.id, true).await);
    }
}
