#![doc = "The `taskforge` library crate."]
#![doc = ""]
#![doc = "Users and tasks behind a JWT-authenticated API. The credential and token"]
#![doc = "lifecycle (password hashing, HS512/ES384 access tokens, single-use reset"]
#![doc = "tokens) lives in [`auth`]; [`pagination`] compiles list query parameters."]
#![doc = "The binary (`main.rs`) loads [`config::Config`] and serves [`routes`]."]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod store;

use std::sync::Arc;

use auth::{
    Authenticator, PasswordHasher, PasswordResetLedger, ResetNotifier, SigningKey, TokenIssuer,
};
use clock::Clock;
use pagination::ListQueryCompiler;
use store::{ResetTokenStore, TaskStore, UserStore};

/// Lifetimes and limits taken from [`config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct AppSettings {
    pub token_lifetime_hours: i64,
    pub password_reset_expiration_hours: i64,
    pub pagination_max_limit: i64,
}

impl From<&config::Config> for AppSettings {
    fn from(config: &config::Config) -> Self {
        Self {
            token_lifetime_hours: config.jwt.lifetime_hours,
            password_reset_expiration_hours: config.password_reset_expiration_hours,
            pagination_max_limit: config.pagination_max_limit,
        }
    }
}

/// Shared state handed to every handler as `web::Data<AppState>`.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub resets: Arc<dyn ResetTokenStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub reset_notifier: Arc<dyn ResetNotifier>,
    pub tokens: Arc<TokenIssuer>,
    pub authenticator: Authenticator,
    pub password_resets: PasswordResetLedger,
    pub list_queries: ListQueryCompiler,
}

impl AppState {
    /// Wires the auth components on top of the given stores.
    pub fn new(
        users: Arc<dyn UserStore>,
        resets: Arc<dyn ResetTokenStore>,
        tasks: Arc<dyn TaskStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        reset_notifier: Arc<dyn ResetNotifier>,
        signing_key: SigningKey,
        settings: AppSettings,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(
            signing_key,
            settings.token_lifetime_hours,
            clock.clone(),
        ));
        let authenticator = Authenticator::new(users.clone(), hasher.clone(), tokens.clone());
        let password_resets = PasswordResetLedger::new(
            resets.clone(),
            users.clone(),
            hasher.clone(),
            clock.clone(),
            settings.password_reset_expiration_hours,
        );

        Self {
            users,
            resets,
            tasks,
            hasher,
            clock,
            reset_notifier,
            tokens,
            authenticator,
            password_resets,
            list_queries: ListQueryCompiler::new(settings.pagination_max_limit),
        }
    }
}
