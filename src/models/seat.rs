use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A placed, labeled point on the floor plan. Coordinates are percentages
/// (0-100) of the logical canvas, so the layout is resolution independent.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
}
