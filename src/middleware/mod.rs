use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::errors::ApiError;
use crate::models::User;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Sign a bearer token for the given account email.
pub fn issue_token(email: &str, auth: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let expire = Utc::now() + chrono::Duration::days(auth.token_expiry_days);
    let claims = Claims {
        sub: email.to_string(),
        exp: expire.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
}

/// Decode a bearer token, returning the subject email. Expired or
/// malformed tokens yield `None`.
pub fn verify_token(token: &str, secret: &str) -> Option<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .ok()
}

/// Extractor for any authenticated user. The session is the token itself:
/// restoring it means decoding the JWT and reloading the account row.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

        let email = verify_token(token, &state.config.auth.jwt_secret)
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

        let user = User::find_by_email(&email, &state.db)
            .await
            .map_err(|e| ApiError::database("load_auth_user", e))?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser(user))
    }
}

/// Extractor for routes gated behind the superadmin role. Unprivileged
/// callers are refused outright, never shown the underlying resource.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_superadmin() {
            return Err(ApiError::Forbidden("SuperAdmin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry_days: 7,
            superadmin_email: "superadmin@seat.com".to_string(),
            superadmin_name: "Super Admin".to_string(),
            superadmin_password: "superadmin123".to_string(),
        }
    }

    #[test]
    fn token_round_trip() {
        let auth = test_auth();
        let token = issue_token("alice@example.com", &auth).unwrap();
        assert_eq!(
            verify_token(&token, &auth.jwt_secret).as_deref(),
            Some("alice@example.com")
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = test_auth();
        let token = issue_token("alice@example.com", &auth).unwrap();
        assert_eq!(verify_token(&token, "other-secret"), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = test_auth();
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert_eq!(verify_token(&token, &auth.jwt_secret), None);
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert_eq!(verify_token("not-a-jwt", "test-secret"), None);
    }
}
