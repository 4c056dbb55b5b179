use serde::Deserialize;
use std::env;

// Top-level configuration container
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

// Database settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Token signing and bootstrap superadmin settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub superadmin_email: String,
    pub superadmin_name: String,
    pub superadmin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seatdesk=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
                token_expiry_days: env::var("TOKEN_EXPIRY_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .expect("TOKEN_EXPIRY_DAYS must be a valid number"),
                superadmin_email: env::var("SUPERADMIN_EMAIL")
                    .unwrap_or_else(|_| "superadmin@seat.com".to_string()),
                superadmin_name: env::var("SUPERADMIN_NAME")
                    .unwrap_or_else(|_| "Super Admin".to_string()),
                superadmin_password: env::var("SUPERADMIN_PASSWORD")
                    .unwrap_or_else(|_| "superadmin123".to_string()),
            },
        }
    }
}
