use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{ApiError, ApiResult};
use crate::middleware::AdminUser;
use crate::models::{BookedSeatMap, Occupant, Seat, Weekday};
use crate::seatmap;
use crate::AppState;

/// Upper bound on the decoded background image (matches the editor's
/// upload limit).
pub const MAX_BACKGROUND_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/layout", get(get_layout).post(save_layout))
        .route("/seats/booked", get(get_booked_seats))
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutPayload {
    seats: Vec<Seat>,
    background_image: Option<String>,
}

// GET /layout — public: the floor plan is visible before login too.
async fn get_layout(State(state): State<Arc<AppState>>) -> ApiResult<Json<LayoutPayload>> {
    let seats = sqlx::query_as::<_, Seat>("SELECT id, label, x, y FROM seats ORDER BY ordinal")
        .fetch_all(&state.db.pool)
        .await
        .map_err(|e| ApiError::database("load_seats", e))?;

    let background_image = sqlx::query_scalar::<_, Option<String>>(
        "SELECT background_image FROM seat_layout ORDER BY id LIMIT 1",
    )
    .fetch_optional(&state.db.pool)
    .await
    .map_err(|e| ApiError::database("load_layout", e))?
    .flatten();

    Ok(Json(LayoutPayload {
        seats,
        background_image,
    }))
}

// POST /layout (superadmin) — wholesale replacement: delete every seat,
// insert the submitted list, upsert the background image, all in one
// transaction. Concurrent saves are last-write-wins by design.
async fn save_layout(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<LayoutPayload>,
) -> ApiResult<Json<LayoutPayload>> {
    seatmap::validate_seats(&payload.seats).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let Some(ref image) = payload.background_image {
        let size = decoded_image_size(image)?;
        if size > MAX_BACKGROUND_IMAGE_BYTES {
            return Err(ApiError::BadRequest(
                "Background image too large (max 5MB)".to_string(),
            ));
        }
    }

    let mut tx = state
        .db
        .pool
        .begin()
        .await
        .map_err(|e| ApiError::database("begin_save_layout", e))?;

    sqlx::query("DELETE FROM seats")
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::database("clear_seats", e))?;

    for (ordinal, seat) in payload.seats.iter().enumerate() {
        sqlx::query("INSERT INTO seats (id, label, x, y, ordinal) VALUES ($1, $2, $3, $4, $5)")
            .bind(&seat.id)
            .bind(&seat.label)
            .bind(seat.x)
            .bind(seat.y)
            .bind(ordinal as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::database("insert_seat", e))?;
    }

    let updated = sqlx::query("UPDATE seat_layout SET background_image = $1, updated_at = NOW()")
        .bind(&payload.background_image)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::database("update_layout", e))?;

    if updated.rows_affected() == 0 {
        sqlx::query("INSERT INTO seat_layout (background_image) VALUES ($1)")
            .bind(&payload.background_image)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::database("insert_layout", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| ApiError::database("commit_save_layout", e))?;

    tracing::info!(seats = payload.seats.len(), "layout replaced");
    Ok(Json(payload))
}

#[derive(Debug, Deserialize)]
struct BookedQuery {
    weekday: i32,
}

#[derive(Debug, Serialize)]
struct BookedSeatsResponse {
    booked_seats: BookedSeatMap,
}

// GET /seats/booked?weekday=N — occupancy map for one weekday. Pending
// and approved bookings both count as occupied.
async fn get_booked_seats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookedQuery>,
) -> ApiResult<Json<BookedSeatsResponse>> {
    let weekday = Weekday::new(params.weekday).ok_or_else(|| {
        ApiError::BadRequest("Weekday must be between 0 (Monday) and 6 (Sunday)".to_string())
    })?;

    let rows = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
        "SELECT b.seat_id, b.status, u.name, u.email
         FROM bookings b
         LEFT JOIN users u ON u.id = b.user_id
         WHERE b.weekday = $1 AND b.status IN ('pending', 'approved')",
    )
    .bind(weekday.index())
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| ApiError::database("load_booked_seats", e))?;

    let mut booked_seats = BookedSeatMap::new();
    for (seat_id, status, user_name, user_email) in rows {
        booked_seats.insert(
            seat_id,
            Occupant {
                user_name: user_name.unwrap_or_else(|| "Unknown".to_string()),
                user_email,
                status,
            },
        );
    }

    Ok(Json(BookedSeatsResponse { booked_seats }))
}

/// Decoded byte count of a background image submitted as a data URL (or
/// bare base64). Rejects payloads that are not valid base64.
fn decoded_image_size(image: &str) -> ApiResult<usize> {
    let encoded = match image.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => image,
    };
    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::BadRequest("Background image is not valid base64 data".to_string()))?;
    Ok(decoded.len())
}
