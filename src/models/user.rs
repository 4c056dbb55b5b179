use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role gates layout editing, booking approval and user management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Superadmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Superadmin => "superadmin",
        }
    }

    pub fn parse(s: &str) -> Option<UserRole> {
        match s {
            "user" => Some(UserRole::User),
            "superadmin" => Some(UserRole::Superadmin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> UserRole {
        // Unknown values in the column degrade to the unprivileged role
        UserRole::parse(&self.role).unwrap_or(UserRole::User)
    }

    pub fn is_superadmin(&self) -> bool {
        self.role() == UserRole::Superadmin
    }

    pub async fn find_by_email(
        email: &str,
        db: &crate::database::Database,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn find_by_id(
        id: i32,
        db: &crate::database::Database,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!(UserRole::parse("user"), Some(UserRole::User));
        assert_eq!(UserRole::parse("superadmin"), Some(UserRole::Superadmin));
        assert_eq!(UserRole::parse("admin"), None);
        assert_eq!(UserRole::Superadmin.as_str(), "superadmin");
    }

    #[test]
    fn unknown_role_is_unprivileged() {
        let user = User {
            id: 1,
            email: "a@b.c".into(),
            name: "A".into(),
            password_hash: String::new(),
            role: "owner".into(),
            created_at: Default::default(),
        };
        assert!(!user.is_superadmin());
    }
}
