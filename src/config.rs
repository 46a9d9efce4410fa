use std::env;
use std::str::FromStr;

use crate::auth::{AuthError, SigningConfig};
use crate::pagination::MAX_LIMIT;

/// Upper bound for any lifetime or window read from the environment (100 years).
pub const MAX_DURATION_HOURS: i64 = 876_000;

/// Access token settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub signing: SigningConfig,
    /// Access token lifetime, in hours.
    pub lifetime_hours: i64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt: JwtConfig,
    /// How long a password reset token stays valid, in hours.
    pub password_reset_expiration_hours: i64,
    pub pagination_max_limit: i64,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AuthError::Config("DATABASE_URL must be set".into()))?;

        let algorithm = lookup("JWT_ALGO").unwrap_or_else(|| "HS512".to_string());
        let signing = SigningConfig::from_parts(
            &algorithm,
            lookup("JWT_SECRET"),
            lookup("JWT_PRIVATE_KEY_PATH"),
            lookup("JWT_PUBLIC_KEY_PATH"),
        )?;

        Ok(Self {
            database_url,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt: JwtConfig {
                signing,
                lifetime_hours: parse_hours(&lookup, "JWT_LIFETIME", 24)?,
            },
            password_reset_expiration_hours: parse_hours(
                &lookup,
                "FORGOTTEN_PASSWORD_EXPIRATION_DURATION",
                24,
            )?,
            pagination_max_limit: parse_or(&lookup, "PAGINATION_MAX_LIMIT", MAX_LIMIT)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AuthError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AuthError::Config(format!("{} must be a number, got {:?}", key, raw))),
        None => Ok(default),
    }
}

/// A duration in hours, within `1..=MAX_DURATION_HOURS`.
fn parse_hours<F>(lookup: &F, key: &str, default: i64) -> Result<i64, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    let hours = parse_or(lookup, key, default)?;
    if !(1..=MAX_DURATION_HOURS).contains(&hours) {
        return Err(AuthError::Config(format!(
            "{} must be between 1 and {} hours, got {}",
            key, MAX_DURATION_HOURS, hours
        )));
    }
    Ok(hours)
}
