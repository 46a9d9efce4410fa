use sha2::{Digest, Sha512};
use std::fmt;

/// Stored, one-way representation of a password.
///
/// Only ever produced by a [`PasswordHasher`]; compared by equality of the
/// derived form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the digest, even in debug output.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Derives credentials from plaintext passwords.
///
/// Callers depend on this trait rather than on a concrete digest so the
/// scheme can be replaced without touching login or reset code.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Credential;

    /// Hashes `candidate` and compares it with a stored credential.
    fn verify(&self, candidate: &str, stored: &str) -> bool {
        self.hash(candidate).as_str() == stored
    }
}

/// Unsalted SHA-512, lowercase hex encoded (128 characters).
///
/// Kept for compatibility with credentials already stored in `users.password`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha512PasswordHasher;

impl PasswordHasher for Sha512PasswordHasher {
    fn hash(&self, plaintext: &str) -> Credential {
        Credential(hex::encode(Sha512::digest(plaintext.as_bytes())))
    }
}
