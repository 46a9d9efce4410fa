use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{NewUser, UserInput, UserProfile},
    pagination::PaginationQuery,
    AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Prefix used to qualify user sort fields, matching the `users u` alias.
const USER_TABLE_ALIAS: &str = "u";

/// Creates a new user. The password is stored as a credential, never in clear.
///
/// ## Responses:
/// - `201 Created`: The new `User`.
/// - `400 Bad Request`: Username already taken.
/// - `422 Unprocessable Entity`: Input validation failed.
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    user_data: web::Json<UserInput>,
    _caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let input = user_data.into_inner();

    let user = state
        .users
        .create(NewUser {
            password: state.hasher.hash(&input.password),
            username: input.username,
            lastname: input.lastname,
            firstname: input.firstname,
        })
        .await?;

    log::info!("User {} created", user.id);
    Ok(HttpResponse::Created().json(user))
}

/// Lists users, paginated with `p` / `l` and sorted with `s` (e.g. `+lastname,-created_at`).
///
/// ## Responses:
/// - `200 OK`: `{data: [User], total}`.
#[get("")]
pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<PaginationQuery>,
    _caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let list_query = state
        .list_queries
        .compile(&query, Some(USER_TABLE_ALIAS));
    let users = state.users.list(&list_query).await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Retrieves a user by id.
#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    _caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = state
        .users
        .find_by_id(*id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found".into()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Replaces a user's profile and password.
///
/// ## Responses:
/// - `200 OK`: The updated `User`.
/// - `404 Not Found`: No live user with this id.
/// - `422 Unprocessable Entity`: Input validation failed.
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user_data: web::Json<UserInput>,
    _caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let user = state
        .users
        .update(
            id.into_inner(),
            &UserProfile::from(&*user_data),
            &state.hasher.hash(&user_data.password),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("No user found".into()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Soft-deletes a user and drops any pending password reset.
///
/// ## Responses:
/// - `204 No Content`: Deleted.
/// - `404 Not Found`: No live user with this id.
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();

    if !state.users.soft_delete(id).await? {
        return Err(AppError::NotFound("No user found".into()));
    }
    state.resets.delete_by_user_id(id).await?;

    log::info!("User {} deleted by {}", id, caller.0.sub);
    Ok(HttpResponse::NoContent().finish())
}
