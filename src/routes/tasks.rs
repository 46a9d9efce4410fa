use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::TaskInput,
    pagination::PaginationQuery,
    AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves a page of tasks.
///
/// ## Query Parameters:
/// - `p` (optional): Page number, 1-based. Invalid values fall back to 1.
/// - `l` (optional): Page size, at most the configured maximum (100 by default).
/// - `s` (optional): Sort list, e.g. `+name,-created_at`. Unknown fields are ignored.
///
/// ## Responses:
/// - `200 OK`: `{data: [Task], total}`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query: web::Query<PaginationQuery>,
    _caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let list_query = state.list_queries.compile(&query, None);
    let tasks = state.tasks.list(&list_query).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task.
///
/// ## Request Body:
/// - `name`: 3 to 127 characters (required).
/// - `description` (optional): At most 255 characters.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `422 Unprocessable Entity`: If input validation on `TaskInput` fails.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<TaskInput>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .create(task_data.into_inner(), state.clock.now())
        .await?;

    log::debug!("Task {} created by {}", task.id, caller.0.sub);
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON.
/// - `404 Not Found`: If the task does not exist.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    _caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .find_by_id(*id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}
