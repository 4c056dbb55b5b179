use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatdesk::{config::Config, controllers, models::UserRole, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SeatDesk API");

    let host = config.app.host.clone();
    let port = config.app.port;

    // Connect, migrate, build shared state
    let app_state = AppState::new(config).await?;
    info!("Database connected, migrations applied");

    seed_superadmin(&app_state).await?;

    let app = Router::new()
        .route("/", get(|| async { "SeatDesk API v1.0" }))
        .route("/health", get(health))
        .merge(controllers::routes())
        .with_state(app_state)
        // Browser clients run on a separate origin during development
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "database unavailable"),
    }
}

// Ensure the bootstrap superadmin account exists so a fresh deployment is
// immediately manageable. Existing accounts are left untouched.
async fn seed_superadmin(state: &AppState) -> anyhow::Result<()> {
    let auth = &state.config.auth;

    let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(&auth.superadmin_email)
        .fetch_optional(&state.db.pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = bcrypt::hash(&auth.superadmin_password, bcrypt::DEFAULT_COST)?;
    sqlx::query("INSERT INTO users (email, name, password_hash, role) VALUES ($1, $2, $3, $4)")
        .bind(&auth.superadmin_email)
        .bind(&auth.superadmin_name)
        .bind(&password_hash)
        .bind(UserRole::Superadmin.as_str())
        .execute(&state.db.pool)
        .await?;

    info!(email = %auth.superadmin_email, "superadmin account created");
    Ok(())
}
