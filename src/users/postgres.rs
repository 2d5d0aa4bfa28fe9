/// Postgres-backed user directory

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::users::directory::UserDirectory;
use crate::users::model::{NewUser, Projection, User, DEFAULT_PHOTO, DEFAULT_ROLE};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    photo: String,
    role: String,
    verified: bool,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, projection: Projection) -> User {
        let password_hash = match projection {
            Projection::WithCredentials => Some(self.password_hash),
            Projection::Public => None,
        };
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            photo: self.photo,
            role: self.role,
            verified: self.verified,
            password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, photo, role, verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, email, photo, role, verified, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.password_hash)
        .bind(DEFAULT_PHOTO)
        .bind(DEFAULT_ROLE)
        .bind(true)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %row.id, "User record created");
        Ok(row.into_user(Projection::Public))
    }

    async fn find_by_email(
        &self,
        email: &str,
        projection: Projection,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, photo, role, verified, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user(projection)))
    }

    async fn find_by_id(&self, id: Uuid, projection: Projection) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, photo, role, verified, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user(projection)))
    }
}
