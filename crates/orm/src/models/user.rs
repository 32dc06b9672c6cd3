use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A row of `users`
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    /// Lower-cased, unique, at most 20 characters
    pub user_name: String,
    /// Lower-cased, unique, at most 50 characters
    pub email: String,
    /// bcrypt or argon2 hash
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user together with the names of its roles
#[derive(Debug, Clone)]
pub struct UserWithRoles {
    pub user: User,
    pub roles: Vec<String>,
}

impl UserWithRoles {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Values for a new `users` row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    /// Already hashed
    pub password: String,
}

/// Profile update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub user_name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    /// Nothing to update
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.email.is_none()
    }
}
