//! Signing key resolution.
//!
//! The configured algorithm is parsed once into a [`SigningConfig`] and then
//! resolved by [`KeyMaterialProvider`] into an opaque [`SigningKey`] holding
//! both halves: the key that signs access tokens and the key that verifies
//! them. HS512 uses the shared secret for both; ES384 reads a PKCS#8 private
//! key and a PKIX public key from PEM files.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use std::fmt;
use std::path::{Path, PathBuf};

use super::errors::AuthError;

/// Shortest accepted HS512 secret, in bytes.
pub const MIN_SECRET_LEN: usize = 8;

/// Signing setup selected by the `JWT_ALGO` tag.
#[derive(Clone, PartialEq, Eq)]
pub enum SigningConfig {
    /// `HS512` with a shared secret.
    Symmetric { secret: String },
    /// `ES384` with PEM key files.
    Asymmetric {
        private_key_path: PathBuf,
        public_key_path: PathBuf,
    },
}

impl SigningConfig {
    /// Builds the variant named by `algorithm`.
    ///
    /// Unknown tags are rejected, never defaulted. Inputs required by the
    /// selected algorithm must be present.
    pub fn from_parts(
        algorithm: &str,
        secret: Option<String>,
        private_key_path: Option<String>,
        public_key_path: Option<String>,
    ) -> Result<Self, AuthError> {
        match algorithm {
            "HS512" => {
                let secret = secret
                    .ok_or_else(|| AuthError::Config("JWT_SECRET must be set for HS512".into()))?;
                Ok(SigningConfig::Symmetric { secret })
            }
            "ES384" => {
                let private_key_path = private_key_path.ok_or_else(|| {
                    AuthError::Config("JWT_PRIVATE_KEY_PATH must be set for ES384".into())
                })?;
                let public_key_path = public_key_path.ok_or_else(|| {
                    AuthError::Config("JWT_PUBLIC_KEY_PATH must be set for ES384".into())
                })?;
                Ok(SigningConfig::Asymmetric {
                    private_key_path: private_key_path.into(),
                    public_key_path: public_key_path.into(),
                })
            }
            other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            SigningConfig::Symmetric { .. } => Algorithm::HS512,
            SigningConfig::Asymmetric { .. } => Algorithm::ES384,
        }
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningConfig::Symmetric { .. } => f
                .debug_struct("Symmetric")
                .field("secret", &"<redacted>")
                .finish(),
            SigningConfig::Asymmetric {
                private_key_path,
                public_key_path,
            } => f
                .debug_struct("Asymmetric")
                .field("private_key_path", private_key_path)
                .field("public_key_path", public_key_path)
                .finish(),
        }
    }
}

/// Reads raw key file contents.
pub trait KeyFileReader: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Reads key files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsKeyFileReader;

impl KeyFileReader for FsKeyFileReader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Resolved key material. The algorithm always matches the key shape.
#[derive(Clone)]
pub struct SigningKey {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Turns a [`SigningConfig`] into a [`SigningKey`].
pub struct KeyMaterialProvider<R = FsKeyFileReader> {
    reader: R,
}

impl KeyMaterialProvider {
    pub fn new() -> Self {
        Self {
            reader: FsKeyFileReader,
        }
    }
}

impl Default for KeyMaterialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: KeyFileReader> KeyMaterialProvider<R> {
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Resolves the key for the configured algorithm.
    ///
    /// # Errors
    /// * `Config` - HS512 secret shorter than [`MIN_SECRET_LEN`] bytes
    /// * `KeyLoad` - ES384 key file missing, without a PEM block, or unparseable
    pub fn resolve(&self, config: &SigningConfig) -> Result<SigningKey, AuthError> {
        match config {
            SigningConfig::Symmetric { secret } => {
                if secret.len() < MIN_SECRET_LEN {
                    return Err(AuthError::Config(format!(
                        "JWT secret must have at least {} characters",
                        MIN_SECRET_LEN
                    )));
                }
                Ok(SigningKey {
                    algorithm: Algorithm::HS512,
                    encoding: EncodingKey::from_secret(secret.as_bytes()),
                    decoding: DecodingKey::from_secret(secret.as_bytes()),
                })
            }
            SigningConfig::Asymmetric {
                private_key_path,
                public_key_path,
            } => {
                let private_pem = self.read_key(private_key_path)?;
                let encoding = EncodingKey::from_ec_pem(&private_pem)
                    .map_err(|e| key_load_error(private_key_path, e))?;

                let public_pem = self.read_key(public_key_path)?;
                let decoding = DecodingKey::from_ec_pem(&public_pem)
                    .map_err(|e| key_load_error(public_key_path, e))?;

                log::debug!(
                    "Loaded ES384 key pair from {} and {}",
                    private_key_path.display(),
                    public_key_path.display()
                );

                Ok(SigningKey {
                    algorithm: Algorithm::ES384,
                    encoding,
                    decoding,
                })
            }
        }
    }

    fn read_key(&self, path: &Path) -> Result<Vec<u8>, AuthError> {
        self.reader.read(path).map_err(|e| key_load_error(path, e))
    }
}

fn key_load_error(path: &Path, reason: impl fmt::Display) -> AuthError {
    AuthError::KeyLoad {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
