//! User repository.
//!
//! Account management (registration, passwords) belongs to the external
//! authentication collaborator; the chat core only needs to resolve the
//! identity behind a verified token.

use super::DbPool;
use crate::{ReadRoomError, Result};

/// User entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// User ID.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name shown in chat.
    pub display_name: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// New user for creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
}

impl NewUser {
    /// Create a new user record.
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
        }
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, display_name) VALUES ($1, $2) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.display_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ReadRoomError::NotFound("user".into()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, display_name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, display_name, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(user)
    }
}
