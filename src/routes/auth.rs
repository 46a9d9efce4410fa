use crate::{
    auth::{
        ForgottenPasswordRequest, LoginRequest, LoginResponse, PasswordUpdateRequest,
        ResetRequestedResponse,
    },
    error::AppError,
    AppState,
};
use actix_web::{patch, post, web, HttpResponse, Responder};
use validator::Validate;

/// Login user
///
/// Authenticates a user and returns the user, an access token and its expiry.
///
/// ## Responses:
/// - `200 OK`: `LoginResponse` as JSON.
/// - `401 Unauthorized`: Unknown username or wrong password (indistinguishable).
/// - `422 Unprocessable Entity`: Body fails validation.
/// - `500 Internal Server Error`: Storage or token signing failure.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let outcome = state
        .authenticator
        .login(&login_data.username, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse::from(outcome)))
}

/// Forgotten password
///
/// Creates (or replaces) the pending password reset of the user whose
/// username is `email` and passes it to the configured `ResetNotifier`.
/// Any token issued earlier for the same user stops working. The token
/// itself is never part of the response.
///
/// ## Responses:
/// - `200 OK`: `{expired_at}`.
/// - `404 Not Found`: No user with this email.
/// - `422 Unprocessable Entity`: `email` is not an email address.
#[post("/forgotten-password/{email}")]
pub async fn forgotten_password(
    state: web::Data<AppState>,
    path: web::Path<ForgottenPasswordRequest>,
) -> Result<impl Responder, AppError> {
    path.validate()?;

    let user = state
        .users
        .find_by_username(&path.email)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found".into()))?;

    let reset = state.password_resets.request_reset(user.id).await?;
    state.reset_notifier.notify(&user, &reset).await?;

    Ok(HttpResponse::Ok().json(ResetRequestedResponse {
        expired_at: reset.expired_at,
    }))
}

/// Update password
///
/// Redeems a password reset token. Succeeds at most once per token.
///
/// ## Responses:
/// - `200 OK`: Password changed.
/// - `400 Bad Request`: New password equals the current one.
/// - `404 Not Found`: Token unknown, expired or already used.
/// - `422 Unprocessable Entity`: Password shorter than 8 characters.
#[patch("/update-password/{token}")]
pub async fn update_password(
    state: web::Data<AppState>,
    token: web::Path<String>,
    body: web::Json<PasswordUpdateRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    state
        .password_resets
        .redeem(&token, &body.password)
        .await?;

    Ok(HttpResponse::Ok().finish())
}
