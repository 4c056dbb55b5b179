pub mod auth;
pub mod bookings;
pub mod layout;
pub mod users;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(layout::routes())
        .merge(bookings::routes())
}
