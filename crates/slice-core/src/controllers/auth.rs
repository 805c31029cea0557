use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::SliceError;
use crate::extractors::{AuthUser, Json};
use crate::models::user::UserResponse;
use crate::response::ApiResponse;
use crate::services::auth as service;

use super::AppState;

// ── Request / Response types ──

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "is required (max 50 characters)"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify-email/{token}", get(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
}

// ── Handlers ──

/// Register a new customer account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<ApiResponse<UserResponse>, SliceError> {
    let user = service::signup(
        &state.db,
        &state.config,
        state.mailer.as_ref(),
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await?;

    let message = if state.config.security.require_email_verification {
        "User registered successfully. Please check your email to verify your account."
    } else {
        "User registered successfully."
    };
    Ok(ApiResponse::created(UserResponse::from(user)).with_message(message))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Email not verified")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, SliceError> {
    let outcome = service::login(&state.db, &state.config, &payload.email, &payload.password).await?;
    Ok(ApiResponse::success(LoginResponse {
        token: outcome.token,
        user: UserResponse::from(outcome.user),
    })
    .with_message("Login successful"))
}

/// Log out. Tokens are stateless; the client discards its copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "auth"
)]
pub async fn logout(user: AuthUser) -> ApiResponse<()> {
    tracing::info!(user_id = user.id, email = %user.email, "user logged out");
    ApiResponse::message("Logout successful")
}

/// Confirm an email address with the token from the verification email.
#[utoipa::path(
    get,
    path = "/api/auth/verify-email/{token}",
    params(("token" = String, Path, description = "Raw verification token")),
    responses(
        (status = 200, description = "Email verified"),
        (status = 400, description = "Invalid or expired verification token")
    ),
    security(("api_key" = [])),
    tag = "auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<ApiResponse<()>, SliceError> {
    service::verify_email(&state.db, &token).await?;
    Ok(ApiResponse::message(
        "Email verified successfully. You can now login.",
    ))
}

/// Send a fresh verification email.
#[utoipa::path(
    post,
    path = "/api/auth/resend-verification",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Verification email sent"),
        (status = 400, description = "Missing email or already verified"),
        (status = 404, description = "No user with this email")
    ),
    security(("api_key" = [])),
    tag = "auth"
)]
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<ApiResponse<()>, SliceError> {
    service::resend_verification(&state.db, &state.config, state.mailer.as_ref(), &payload.email)
        .await?;
    Ok(ApiResponse::message("Verification email sent successfully"))
}

/// Request a password-reset link.
///
/// The response is identical whether or not the account exists.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists"),
        (status = 400, description = "Missing email")
    ),
    security(("api_key" = [])),
    tag = "auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<ApiResponse<()>, SliceError> {
    service::forgot_password(&state.db, &state.config, state.mailer.as_ref(), &payload.email)
        .await?;
    Ok(ApiResponse::message(service::FORGOT_PASSWORD_MESSAGE))
}

/// Set a new password with the token from the reset email.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    params(("token" = String, Path, description = "Raw reset token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid or expired reset token, or weak password")
    ),
    security(("api_key" = [])),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, SliceError> {
    service::reset_password(&state.db, &state.config, &token, &payload.password).await?;
    Ok(ApiResponse::message(
        "Password reset successful. You can now login with your new password.",
    ))
}
