use async_trait::async_trait;

use super::errors::AuthError;
use crate::models::{PasswordReset, User};

/// Delivers a freshly issued reset token to the account owner.
///
/// The token never goes back to whoever asked for the reset; only the
/// notifier sees it.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn notify(&self, user: &User, reset: &PasswordReset) -> Result<(), AuthError>;
}

/// Writes the reset link to the application log. Used until a mail
/// transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogResetNotifier;

#[async_trait]
impl ResetNotifier for LogResetNotifier {
    async fn notify(&self, user: &User, reset: &PasswordReset) -> Result<(), AuthError> {
        log::info!(
            "Password reset for {}: /api/v1/update-password/{} (valid until {})",
            user.username,
            reset.token,
            reset.expired_at
        );
        Ok(())
    }
}
