#![allow(dead_code)]

use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use taskforge::auth::{
    AuthError, Credential, KeyMaterialProvider, PasswordHasher, ResetNotifier,
    Sha512PasswordHasher, SigningConfig,
};
use taskforge::clock::Clock;
use taskforge::models::{NewUser, Paginated, PasswordReset, Task, TaskInput, User, UserProfile};
use taskforge::pagination::ListQuery;
use taskforge::store::{ResetTokenStore, StoreError, TaskStore, UserStore};
use taskforge::{routes, AppSettings, AppState};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test_secret_for_integration";
pub const RESET_WINDOW_HOURS: i64 = 2;

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Clock that starts at the real current time and only moves when told to.
pub struct TestClock(StdMutex<DateTime<Utc>>);

impl TestClock {
    pub fn new() -> Self {
        Self(StdMutex::new(Utc::now()))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    resets: HashMap<Uuid, PasswordReset>,
    tasks: Vec<Task>,
}

/// In-memory users, password resets and tasks.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub async fn reset_count(&self) -> usize {
        self.tables.lock().await.resets.len()
    }

    pub async fn reset_for(&self, user_id: Uuid) -> Option<PasswordReset> {
        self.tables.lock().await.resets.get(&user_id).cloned()
    }

    pub async fn stored_password(&self, user_id: Uuid) -> Option<String> {
        let tables = self.tables.lock().await;
        tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.password.clone())
    }
}

fn live(user: &User) -> bool {
    user.deleted_at.is_none()
}

fn page<T: Clone>(rows: &[T], query: &ListQuery) -> Paginated<T> {
    Paginated {
        data: rows
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect(),
        total: rows.len() as i64,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| live(u) && u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| live(u) && u.id == id).cloned())
    }

    async fn update_credential(&self, id: Uuid, credential: &Credential) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| live(u) && u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.password = credential.as_str().to_owned();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("username already exists".into()));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            password: user.password.as_str().to_owned(),
            lastname: user.lastname,
            firstname: user.firstname,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<User>, StoreError> {
        let tables = self.tables.lock().await;
        let users: Vec<User> = tables.users.iter().filter(|u| live(u)).cloned().collect();
        Ok(page(&users, query))
    }

    async fn update(
        &self,
        id: Uuid,
        profile: &UserProfile,
        credential: &Credential,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter_mut()
            .find(|u| live(u) && u.id == id)
            .map(|user| {
                user.username = profile.username.clone();
                user.lastname = profile.lastname.clone();
                user.firstname = profile.firstname.clone();
                user.password = credential.as_str().to_owned();
                user.updated_at = Utc::now();
                user.clone()
            }))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| live(u) && u.id == id) {
            Some(user) => {
                user.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn upsert_by_user_id(&self, record: &PasswordReset) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        tables.resets.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .resets
            .values()
            .find(|r| {
                r.token == token
                    && r.is_live(now)
                    && tables.users.iter().any(|u| live(u) && u.id == r.user_id)
            })
            .cloned())
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.tables.lock().await.resets.remove(&user_id);
        Ok(())
    }

    async fn consume(
        &self,
        user_id: Uuid,
        token: &str,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;

        let valid = tables
            .resets
            .get(&user_id)
            .map_or(false, |r| r.token == token && r.is_live(now));
        if !valid {
            return Ok(false);
        }

        let Some(user) = tables.users.iter_mut().find(|u| live(u) && u.id == user_id) else {
            return Ok(false);
        };
        user.password = credential.as_str().to_owned();
        user.updated_at = now;
        tables.resets.remove(&user_id);
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, input: TaskInput, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let task = Task::new(input, now);
        self.tables.lock().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Paginated<Task>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(page(&tables.tasks, query))
    }
}

/// User store whose every call fails, to exercise upstream error paths.
pub struct UnavailableUserStore;

fn unavailable() -> StoreError {
    StoreError::Database("connection refused".into())
}

#[async_trait]
impl UserStore for UnavailableUserStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(unavailable())
    }

    async fn update_credential(&self, _id: Uuid, _credential: &Credential) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(unavailable())
    }

    async fn list(&self, _query: &ListQuery) -> Result<Paginated<User>, StoreError> {
        Err(unavailable())
    }

    async fn update(
        &self,
        _id: Uuid,
        _profile: &UserProfile,
        _credential: &Credential,
    ) -> Result<Option<User>, StoreError> {
        Err(unavailable())
    }

    async fn soft_delete(&self, _id: Uuid) -> Result<bool, StoreError> {
        Err(unavailable())
    }
}

/// Keeps every reset it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: StdMutex<Vec<(String, PasswordReset)>>,
}

impl RecordingNotifier {
    /// Last reset delivered to `username`.
    pub fn last_for(&self, username: &str) -> Option<PasswordReset> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == username)
            .map(|(_, reset)| reset.clone())
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn notify(&self, user: &User, reset: &PasswordReset) -> Result<(), AuthError> {
        self.sent
            .lock()
            .unwrap()
            .push((user.username.clone(), reset.clone()));
        Ok(())
    }
}

/// Application state over a [`MemoryStore`] and a [`TestClock`].
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<TestClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_signing(SigningConfig::Symmetric {
            secret: TEST_SECRET.into(),
        })
    }

    pub fn with_signing(signing: SigningConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(TestClock::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let signing_key = KeyMaterialProvider::new()
            .resolve(&signing)
            .expect("test signing key must resolve");

        let state = web::Data::new(AppState::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(Sha512PasswordHasher),
            clock.clone(),
            notifier.clone(),
            signing_key,
            AppSettings {
                token_lifetime_hours: 24,
                password_reset_expiration_hours: RESET_WINDOW_HOURS,
                pagination_max_limit: 100,
            },
        ));

        Self {
            store,
            clock,
            notifier,
            state,
        }
    }

    pub async fn seed_user(&self, username: &str, password: &str) -> User {
        UserStore::create(
            self.store.as_ref(),
            NewUser {
                username: username.to_string(),
                password: Sha512PasswordHasher.hash(password),
                lastname: "Doe".to_string(),
                firstname: "Jane".to_string(),
            },
        )
        .await
            .expect("seeding user")
    }
}

/// Builds the API the same way `main` does.
pub async fn init_app(
    state: web::Data<AppState>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(state)
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(taskforge::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

/// Logs in through the API and returns the access token.
pub async fn login_token(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(serde_json::json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "login failed");

    let body: serde_json::Value = test::read_body_json(resp).await;
    body["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string()
}
