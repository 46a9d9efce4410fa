//! Single-use, time-bounded password reset tokens.
//!
//! A user has at most one pending reset: a new request replaces the previous
//! record through the store's upsert, so older tokens die immediately.
//! Redemption deletes the record in the same unit as the credential update,
//! which is what makes a token single-use.

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use super::errors::AuthError;
use super::password::PasswordHasher;
use crate::clock::Clock;
use crate::models::PasswordReset;
use crate::store::{ResetTokenStore, UserStore};

pub struct PasswordResetLedger {
    resets: Arc<dyn ResetTokenStore>,
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    window_hours: i64,
}

impl PasswordResetLedger {
    pub fn new(
        resets: Arc<dyn ResetTokenStore>,
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        window_hours: i64,
    ) -> Self {
        Self {
            resets,
            users,
            hasher,
            clock,
            window_hours,
        }
    }

    /// Creates or replaces the pending reset for `user_id`.
    ///
    /// # Errors
    /// * `Config` - the expiration window does not fit in a timestamp
    /// * `Upstream` - the store failed
    pub async fn request_reset(&self, user_id: Uuid) -> Result<PasswordReset, AuthError> {
        let expired_at = Duration::try_hours(self.window_hours)
            .and_then(|window| self.clock.now().checked_add_signed(window))
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "password reset window of {} hours is out of range",
                    self.window_hours
                ))
            })?;

        let record = PasswordReset {
            user_id,
            token: Uuid::new_v4().to_string(),
            expired_at,
        };

        self.resets.upsert_by_user_id(&record).await.map_err(|e| {
            log::error!("Failed to store password reset for user {}: {}", user_id, e);
            AuthError::Upstream(e)
        })?;

        log::info!(
            "Password reset requested for user {}, valid until {}",
            user_id,
            record.expired_at
        );
        Ok(record)
    }

    /// Sets a new password using a pending reset token and returns the user id.
    ///
    /// # Errors
    /// * `NotFound` - token unknown, expired, already used, or user deleted
    /// * `SamePassword` - the new password equals the current one; nothing changes
    /// * `Upstream` - a store failed
    pub async fn redeem(&self, token: &str, new_password: &str) -> Result<Uuid, AuthError> {
        let now = self.clock.now();

        let record = self
            .resets
            .find_valid_by_token(token, now)
            .await?
            .ok_or(AuthError::NotFound)?;

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if self.hasher.verify(new_password, &user.password) {
            log::warn!("Password reset for user {} reused the current password", user.id);
            return Err(AuthError::SamePassword);
        }

        let credential = self.hasher.hash(new_password);
        if !self
            .resets
            .consume(record.user_id, &record.token, &credential, now)
            .await?
        {
            // Redeemed concurrently between lookup and consume.
            return Err(AuthError::NotFound);
        }

        log::info!("Password reset completed for user {}", user.id);
        Ok(user.id)
    }
}
