use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::Credential;

lazy_static! {
    // Letters (any script), spaces, apostrophes and hyphens
    static ref NAME_REGEX: regex::Regex = regex::Regex::new(r"^[\p{L}][\p{L} '\-]*$").unwrap();
}

/// A user row. `password` holds the stored credential and is never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Login name, an email address.
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub lastname: String,
    pub firstname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating or updating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(email, length(max = 127))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(
        length(min = 1, max = 63),
        regex(path = "NAME_REGEX", message = "Lastname contains invalid characters")
    )]
    pub lastname: String,
    #[validate(
        length(min = 1, max = 63),
        regex(path = "NAME_REGEX", message = "Firstname contains invalid characters")
    )]
    pub firstname: String,
}

/// A user ready to be inserted, with its password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: Credential,
    pub lastname: String,
    pub firstname: String,
}

/// Profile fields replaced by a user update.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub username: String,
    pub lastname: String,
    pub firstname: String,
}

impl From<&UserInput> for UserProfile {
    fn from(input: &UserInput) -> Self {
        Self {
            username: input.username.clone(),
            lastname: input.lastname.clone(),
            firstname: input.firstname.clone(),
        }
    }
}
