use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{User, UserRole};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", delete(delete_user))
}

/// Public view of an account: everything except the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// GET /users/me
async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

// GET /users (superadmin)
async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, name, password_hash, role, created_at FROM users ORDER BY id",
    )
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| ApiError::database("list_users", e))?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateUserRequest {
    #[validate(email)]
    email: String,
    name: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    password: String,
    role: Option<String>,
}

// POST /users (superadmin)
async fn create_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let role = match payload.role.as_deref() {
        None => UserRole::User,
        Some(r) => UserRole::parse(r)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid role '{r}'")))?,
    };

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
    .bind(role.as_str())
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| ApiError::database("create_user", e))?;

    tracing::info!(email = %user.email, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// DELETE /users/{id} (superadmin)
async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = User::find_by_id(user_id, &state.db)
        .await
        .map_err(|e| ApiError::database("find_user", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.id == admin.id {
        return Err(ApiError::BadRequest("Cannot delete yourself".to_string()));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("delete_user", e))?;

    tracing::info!(email = %user.email, "user deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}
