pub mod authenticator;
pub mod errors;
pub mod extractors;
pub mod keys;
pub mod middleware;
pub mod notifier;
pub mod password;
pub mod reset;
pub mod token;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;

// Re-export necessary items
pub use authenticator::{Authenticator, LoginOutcome};
pub use errors::AuthError;
pub use extractors::AuthenticatedUser;
pub use keys::{KeyMaterialProvider, SigningConfig, SigningKey};
pub use middleware::AuthMiddleware;
pub use notifier::{LogResetNotifier, ResetNotifier};
pub use password::{Credential, PasswordHasher, Sha512PasswordHasher};
pub use reset::PasswordResetLedger;
pub use token::{AccessClaims, IssuedToken, TokenIssuer};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login name, an email address.
    #[validate(email)]
    pub username: String,
    /// Must be at least 8 characters long.
    #[validate(length(min = 8))]
    pub password: String,
}

/// Response after a successful login: the user, the access token and its
/// expiry formatted as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
    pub expires_at: String,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let expires_at = outcome.token.expires_at_string();
        Self {
            user: outcome.user,
            token: outcome.token.token,
            expires_at,
        }
    }
}

/// Path parameter of a forgotten password request.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgottenPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// Answer to a forgotten password request. Carries no token.
#[derive(Debug, Serialize)]
pub struct ResetRequestedResponse {
    pub expired_at: DateTime<Utc>,
}

/// Body of a password update through a reset token.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordUpdateRequest {
    #[validate(length(min = 8))]
    pub password: String,
}
