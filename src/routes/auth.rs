use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::auth::{
        ActionResponse, AuthResponse, PasswordResetConfirm, PasswordResetRequest, SignInRequest,
        SignUpRequest, UserProfile,
    },
    error::AppError,
    routes::session::CurrentSession,
    services::auth_service,
    state::SharedState,
};

/// Account and session endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
        .route("/auth/password-reset", post(request_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(confirm_password_reset),
        )
}

#[utoipa::path(
    post,
    path = "/auth/sign-up",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
/// Create an account and return a bearer token.
pub async fn sign_up(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SignUpRequest>>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = auth_service::sign_up(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
/// Exchange credentials for a bearer token.
pub async fn sign_in(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SignInRequest>>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(auth_service::sign_in(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/auth/sign-out",
    tag = "auth",
    params(("Authorization" = String, Header, description = "Bearer token")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Missing or unknown token")
    )
)]
pub async fn sign_out(
    State(state): State<SharedState>,
    CurrentSession(session): CurrentSession,
) -> StatusCode {
    auth_service::sign_out(&state, &session);
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    params(("Authorization" = String, Header, description = "Bearer token")),
    responses(
        (status = 200, description = "Signed-in user", body = UserProfile),
        (status = 401, description = "Missing or unknown token")
    )
)]
/// Return the user owning the bearer token.
pub async fn me(CurrentSession(session): CurrentSession) -> Json<UserProfile> {
    Json(UserProfile::from(&session))
}

#[utoipa::path(
    post,
    path = "/auth/password-reset",
    tag = "auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Reset mail sent when the account exists", body = ActionResponse),
        (status = 503, description = "Mail could not be dispatched")
    )
)]
/// Mail a password reset code.
pub async fn request_password_reset(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PasswordResetRequest>>,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    auth_service::request_password_reset(&state, payload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionResponse::new(
            "if the account exists, a reset code has been sent",
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    tag = "auth",
    request_body = PasswordResetConfirm,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid or expired reset code")
    )
)]
/// Choose a new password with a mailed reset code.
pub async fn confirm_password_reset(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PasswordResetConfirm>>,
) -> Result<StatusCode, AppError> {
    auth_service::confirm_password_reset(&state, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
