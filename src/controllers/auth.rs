use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::users::UserResponse;
use crate::errors::{ApiError, ApiResult};
use crate::middleware::{issue_token, AdminUser, AuthUser};
use crate::models::{User, UserRole};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/admin-reset-password", post(admin_reset_password))
}

/// Token envelope handed to the client on login/register. The client keeps
/// it for the session and sends the token back as a bearer header.
#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    user: UserResponse,
}

impl TokenResponse {
    fn for_user(user: User, state: &AppState) -> ApiResult<TokenResponse> {
        let access_token = issue_token(&user.email, &state.config.auth)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: user.into(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email)]
    email: String,
    password: String,
}

// POST /auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::find_by_email(&payload.email, &state.db)
        .await
        .map_err(|e| ApiError::database("find_user", e))?;

    // Same rejection whether the account is missing or the password wrong
    let user = user.ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;
    let ok = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !ok {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    tracing::debug!(email = %user.email, "login succeeded");
    Ok(Json(TokenResponse::for_user(user, &state)?))
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(email)]
    email: String,
    name: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    password: String,
}

// POST /auth/register — self-registration always creates an unprivileged
// account; roles are only assigned through user management.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = User::find_by_email(&payload.email, &state.db)
        .await
        .map_err(|e| ApiError::database("check_user_exists", e))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(format!(
            "Email {} is already registered",
            payload.email
        )));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, name, password_hash, role)
         VALUES ($1, $2, $3, $4)
         RETURNING id, email, name, password_hash, role, created_at",
    )
    .bind(&payload.email)
    .bind(&payload.name)
    .bind(&password_hash)
    .bind(UserRole::User.as_str())
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| ApiError::database("register_user", e))?;

    tracing::info!(email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(TokenResponse::for_user(user, &state)?)))
}

#[derive(Debug, Deserialize, Validate)]
struct PasswordResetRequest {
    old_password: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    new_password: String,
}

// POST /auth/reset-password
async fn reset_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<PasswordResetRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let ok = bcrypt::verify(&payload.old_password, &user.password_hash).unwrap_or(false);
    if !ok {
        return Err(ApiError::BadRequest("Invalid old password".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("reset_password", e))?;

    Ok(Json(json!({ "message": "Password updated successfully" })))
}

#[derive(Debug, Deserialize, Validate)]
struct AdminPasswordResetRequest {
    user_id: i32,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    new_password: String,
}

// POST /auth/admin-reset-password (superadmin)
async fn admin_reset_password(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<AdminPasswordResetRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = User::find_by_id(payload.user_id, &state.db)
        .await
        .map_err(|e| ApiError::database("find_user", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let password_hash = bcrypt::hash(&payload.new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("admin_reset_password", e))?;

    tracing::info!(email = %user.email, "password reset by superadmin");
    Ok(Json(json!({
        "message": format!("Password reset for {}", user.email)
    })))
}
