use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ResetTokenStore, StoreError, TaskStore, UserStore};
use crate::auth::password::Credential;
use crate::models::{NewUser, Paginated, PasswordReset, Task, TaskInput, User, UserProfile};
use crate::pagination::ListQuery;

const USER_COLUMNS: &str =
    "u.id, u.username, u.password, u.lastname, u.firstname, u.created_at, u.updated_at, u.deleted_at";

/// Columns a user list may be ordered by. List queries are compiled with the `u` prefix.
pub const USER_SORTABLE: &[&str] = &[
    "u.username",
    "u.lastname",
    "u.firstname",
    "u.created_at",
    "u.updated_at",
];

const TASK_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Columns a task list may be ordered by.
pub const TASK_SORTABLE: &[&str] = &["id", "name", "created_at", "updated_at"];

/// `users` and `password_resets` tables.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users u WHERE u.username = $1 AND u.deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users u WHERE u.id = $1 AND u.deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_credential(&self, id: Uuid, credential: &Credential) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(credential.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users AS u (id, username, password, lastname, firstname) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(user.password.as_str())
            .bind(&user.lastname)
            .bind(&user.firstname)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<User>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM users u WHERE u.deleted_at IS NULL{} LIMIT $1 OFFSET $2",
            USER_COLUMNS,
            query.order_by_clause(USER_SORTABLE)
        );
        let data = sqlx::query_as::<_, User>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated { data, total })
    }

    async fn update(
        &self,
        id: Uuid,
        profile: &UserProfile,
        credential: &Credential,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users AS u \
             SET username = $1, lastname = $2, firstname = $3, password = $4, updated_at = NOW() \
             WHERE u.id = $5 AND u.deleted_at IS NULL \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&profile.username)
            .bind(&profile.lastname)
            .bind(&profile.firstname)
            .bind(credential.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ResetTokenStore for PgUserStore {
    async fn upsert_by_user_id(&self, record: &PasswordReset) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO password_resets (user_id, token, expired_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET token = EXCLUDED.token, expired_at = EXCLUDED.expired_at",
        )
        .bind(record.user_id)
        .bind(&record.token)
        .bind(record.expired_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, StoreError> {
        let record = sqlx::query_as::<_, PasswordReset>(
            "SELECT pr.user_id, pr.token, pr.expired_at \
             FROM password_resets pr \
                INNER JOIN users u ON u.id = pr.user_id AND u.deleted_at IS NULL \
             WHERE pr.token = $1 AND pr.expired_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn consume(
        &self,
        user_id: Uuid,
        token: &str,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken here makes a concurrent redeemer wait, then see zero rows.
        let deleted = sqlx::query(
            "DELETE FROM password_resets WHERE user_id = $1 AND token = $2 AND expired_at > $3",
        )
        .bind(user_id)
        .bind(token)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let updated = sqlx::query(
            "UPDATE users SET password = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(credential.as_str())
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

/// `tasks` table.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, input: TaskInput, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let task = Task::new(input, now);
        let sql = format!(
            "INSERT INTO tasks (id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.name)
            .bind(&task.description)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Task>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM tasks WHERE deleted_at IS NULL{} LIMIT $1 OFFSET $2",
            TASK_COLUMNS,
            query.order_by_clause(TASK_SORTABLE)
        );
        let data = sqlx::query_as::<_, Task>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated { data, total })
    }
}
