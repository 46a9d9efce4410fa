use thiserror::Error;

use crate::store::StoreError;

/// Failures of the credential and token lifecycle.
///
/// `InvalidCredentials` covers both an unknown username and a wrong password,
/// and `NotFound` covers a wrong, expired or already consumed reset token, so
/// callers cannot tell those cases apart.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported JWT algorithm: {0} (must be HS512 or ES384)")]
    UnsupportedAlgorithm(String),

    #[error("Failed to load key from {path}: {reason}")]
    KeyLoad { path: String, reason: String },

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Upstream failure: {0}")]
    Upstream(#[from] StoreError),

    #[error("Password reset not found")]
    NotFound,

    #[error("New password cannot be the same as the current one")]
    SamePassword,
}
