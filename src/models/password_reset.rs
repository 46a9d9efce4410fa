use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A pending password reset. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PasswordReset {
    pub user_id: Uuid,
    /// Opaque single-use token (UUID v4 string).
    pub token: String,
    pub expired_at: DateTime<Utc>,
}

impl PasswordReset {
    /// A record is live while its expiry is strictly in the future.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expired_at > now
    }
}
