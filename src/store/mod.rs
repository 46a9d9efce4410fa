//! Storage collaborators.
//!
//! The auth core and the routes only talk to these traits; `postgres` holds
//! the sqlx implementations used by the server.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::Credential;
use crate::models::{NewUser, Paginated, PasswordReset, Task, TaskInput, User, UserProfile};
use crate::pagination::ListQuery;

pub use postgres::{PgTaskStore, PgUserStore};

/// Storage failure unrelated to credential correctness.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Users. Soft-deleted rows are invisible to every method.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// # Errors
    /// * `NotFound` - no live user with this id
    async fn update_credential(&self, id: Uuid, credential: &Credential) -> Result<(), StoreError>;

    /// # Errors
    /// * `Conflict` - username already taken
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn list(&self, query: &ListQuery) -> Result<Paginated<User>, StoreError>;

    /// Replaces the profile and the credential of a live user in one write.
    async fn update(
        &self,
        id: Uuid,
        profile: &UserProfile,
        credential: &Credential,
    ) -> Result<Option<User>, StoreError>;

    /// Returns `false` when no live user matched.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Password reset records, at most one per user.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Inserts the record, or atomically replaces the user's existing one.
    async fn upsert_by_user_id(&self, record: &PasswordReset) -> Result<(), StoreError>;

    /// Finds a record with this token, expiring after `now`, whose user is
    /// not deleted.
    async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, StoreError>;

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<(), StoreError>;

    /// Deletes the still-valid record `(user_id, token)` and stores the new
    /// credential as one unit.
    ///
    /// Returns `false`, with nothing changed, if the record was already gone.
    /// Of two concurrent calls for the same record at most one returns `true`.
    async fn consume(
        &self,
        user_id: Uuid,
        token: &str,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, input: TaskInput, now: DateTime<Utc>) -> Result<Task, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Task>, StoreError>;
}
