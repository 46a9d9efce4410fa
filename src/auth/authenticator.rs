use std::sync::Arc;

use super::errors::AuthError;
use super::password::PasswordHasher;
use super::token::{IssuedToken, TokenIssuer};
use crate::models::User;
use crate::store::UserStore;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

/// Verifies login attempts and issues access tokens.
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<TokenIssuer>,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            issuer,
        }
    }

    /// Checks `password` against the stored credential of `username`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - unknown username or wrong password
    /// * `Upstream` - the user store failed
    /// * `Signing` - the token could not be signed
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = match self.users.find_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                log::warn!("Login rejected: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                log::error!("User lookup failed during login: {}", e);
                return Err(AuthError::Upstream(e));
            }
        };

        if !self.hasher.verify(password, &user.password) {
            log::warn!("Login rejected: wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(&user)?;
        log::info!("User {} logged in", user.id);

        Ok(LoginOutcome { user, token })
    }
}
