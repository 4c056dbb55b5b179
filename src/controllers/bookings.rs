use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use std::sync::Arc;
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{BookingStatus, Weekday};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_bookings))
        .route("/bookings/{id}", patch(update_booking).delete(cancel_booking))
        .route("/bookings/{id}/approve", patch(approve_booking))
        .route("/bookings/{id}/reject", patch(reject_booking))
}

/* ---------- shared response shape ---------- */

/// Booking joined with its seat label and owner, the shape every list and
/// approval page renders from.
#[derive(Debug, FromRow, Serialize)]
struct BookingResponse {
    id: i32,
    seat_id: String,
    seat_label: String,
    user_id: i32,
    user_name: String,
    user_email: Option<String>,
    booked_for_name: Option<String>,
    booked_for_email: Option<String>,
    notes: Option<String>,
    status: String,
    weekday: i32,
    created_at: NaiveDateTime,
}

// Seats may be deleted from the layout after booking; fall back to the raw
// seat id so old bookings still render.
const BOOKING_SELECT: &str = "SELECT b.id, b.seat_id,
        COALESCE(s.label, b.seat_id) AS seat_label,
        b.user_id,
        COALESCE(u.name, 'Unknown') AS user_name,
        u.email AS user_email,
        b.booked_for_name, b.booked_for_email, b.notes,
        b.status, b.weekday, b.created_at
 FROM bookings b
 LEFT JOIN seats s ON s.id = b.seat_id
 LEFT JOIN users u ON u.id = b.user_id";

async fn fetch_booking_response(
    state: &AppState,
    booking_id: i32,
) -> ApiResult<Option<BookingResponse>> {
    sqlx::query_as::<_, BookingResponse>(&format!("{BOOKING_SELECT} WHERE b.id = $1"))
        .bind(booking_id)
        .fetch_optional(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("load_booking", e))
}

/* ---------- create & list ---------- */

#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    seat_ids: Vec<String>,
    weekday: i32,
    booked_for_name: Option<String>,
    #[validate(email)]
    booked_for_email: Option<String>,
    notes: Option<String>,
}

// POST /bookings — one booking per requested seat, all inserted in a
// single transaction so a failed conflict check books nothing.
async fn create_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let weekday = Weekday::new(payload.weekday).ok_or_else(|| {
        ApiError::BadRequest("Weekday must be between 0 (Monday) and 6 (Sunday)".to_string())
    })?;

    if payload.seat_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one seat must be selected".to_string(),
        ));
    }

    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| ApiError::database("begin_create_bookings", e))?;

    let mut booking_ids: Vec<i32> = Vec::with_capacity(payload.seat_ids.len());

    for seat_id in &payload.seat_ids {
        let label = sqlx::query_scalar::<_, String>("SELECT label FROM seats WHERE id = $1")
            .bind(seat_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| ApiError::database("find_seat", e))?
            .ok_or_else(|| ApiError::not_found(format!("Seat {seat_id} not found")))?;

        let own_conflict = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
               SELECT 1 FROM bookings
               WHERE user_id = $1 AND seat_id = $2 AND weekday = $3
                 AND status IN ('pending', 'approved')
             )",
        )
        .bind(user.id)
        .bind(seat_id)
        .bind(weekday.index())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ApiError::database("check_own_booking", e))?;

        if own_conflict {
            return Err(ApiError::BadRequest(format!(
                "You already have Seat {label} booked for this weekday"
            )));
        }

        let occupied = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
               SELECT 1 FROM bookings
               WHERE seat_id = $1 AND weekday = $2
                 AND status IN ('pending', 'approved')
             )",
        )
        .bind(seat_id)
        .bind(weekday.index())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ApiError::database("check_seat_occupied", e))?;

        if occupied {
            return Err(ApiError::BadRequest(format!(
                "Seat {label} is already booked for this weekday"
            )));
        }

        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO bookings
               (seat_id, user_id, weekday, booked_for_name, booked_for_email, notes, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(seat_id)
        .bind(user.id)
        .bind(weekday.index())
        .bind(&payload.booked_for_name)
        .bind(&payload.booked_for_email)
        .bind(&payload.notes)
        .bind(BookingStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ApiError::database("insert_booking", e))?;

        booking_ids.push(id);
    }

    tx.commit()
        .await
        .map_err(|e| ApiError::database("commit_create_bookings", e))?;

    tracing::info!(
        user = %user.email,
        weekday = weekday.name(),
        count = booking_ids.len(),
        "bookings created"
    );

    let created = sqlx::query_as::<_, BookingResponse>(&format!(
        "{BOOKING_SELECT} WHERE b.id = ANY($1) ORDER BY b.id"
    ))
    .bind(&booking_ids)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| ApiError::database("load_created_bookings", e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /bookings — own bookings; a superadmin sees everyone's.
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = if user.is_superadmin() {
        sqlx::query_as::<_, BookingResponse>(&format!(
            "{BOOKING_SELECT} ORDER BY b.created_at DESC, b.id"
        ))
        .fetch_all(&state.db.pool)
        .await
    } else {
        sqlx::query_as::<_, BookingResponse>(&format!(
            "{BOOKING_SELECT} WHERE b.user_id = $1 ORDER BY b.created_at DESC, b.id"
        ))
        .bind(user.id)
        .fetch_all(&state.db.pool)
        .await
    }
    .map_err(|e| ApiError::database("list_bookings", e))?;

    Ok(Json(bookings))
}

/* ---------- status transitions ---------- */

#[derive(Debug, Deserialize)]
struct BookingUpdateRequest {
    status: String,
}

// PATCH /bookings/{id} (superadmin)
async fn update_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<i32>,
    Json(payload): Json<BookingUpdateRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let status = BookingStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid status '{}'", payload.status)))?;

    set_status(&state, booking_id, status).await?;

    let booking = fetch_booking_response(&state, booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    Ok(Json(booking))
}

// PATCH /bookings/{id}/approve (superadmin)
async fn approve_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<i32>,
) -> ApiResult<Json<serde_json::Value>> {
    set_status(&state, booking_id, BookingStatus::Approved).await?;
    Ok(Json(json!({ "message": "Booking approved" })))
}

// PATCH /bookings/{id}/reject (superadmin)
async fn reject_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<i32>,
) -> ApiResult<Json<serde_json::Value>> {
    set_status(&state, booking_id, BookingStatus::Rejected).await?;
    Ok(Json(json!({ "message": "Booking rejected" })))
}

async fn set_status(state: &AppState, booking_id: i32, status: BookingStatus) -> ApiResult<()> {
    let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(booking_id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("update_booking_status", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }
    tracing::info!(booking_id, status = status.as_str(), "booking status changed");
    Ok(())
}

/* ---------- cancellation ---------- */

// DELETE /bookings/{id} — the owner may cancel their own booking; a
// superadmin may cancel anyone's.
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<i32>,
) -> ApiResult<Json<serde_json::Value>> {
    let owner_id = sqlx::query_scalar::<_, i32>("SELECT user_id FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_optional(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("find_booking", e))?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if !user.is_superadmin() && owner_id != user.id {
        return Err(ApiError::Forbidden("Not authorized".to_string()));
    }

    sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(booking_id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("delete_booking", e))?;

    tracing::info!(booking_id, by = %user.email, "booking cancelled");
    Ok(Json(json!({ "message": "Booking cancelled" })))
}
