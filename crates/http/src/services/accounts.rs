//! Account creation and profile changes shared by signup, self-service and admin

use crate::error::{HttpError, HttpResult};
use bookstore_auth::PasswordManager;
use bookstore_core::RoleName;
use bookstore_orm::models::{NewUser, UserChanges, UserWithRoles};
use bookstore_orm::repositories::users;
use bookstore_orm::PgConnection;

pub fn username_taken() -> HttpError {
    HttpError::conflict("Username already taken")
        .with_error("username", "The username has already been taken.")
}

pub fn email_taken() -> HttpError {
    HttpError::conflict("Email already taken").with_error("email", "The email has already been taken.")
}

/// Trimmed and lower-cased
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Role names as stored; `ROLE_USER` when none are given
pub fn canonical_roles(requested: Option<&[String]>) -> Vec<String> {
    let mut roles: Vec<String> = requested
        .unwrap_or_default()
        .iter()
        .map(|name| RoleName::canonical(name))
        .filter(|name| !name.is_empty())
        .collect();
    roles.dedup();
    if roles.is_empty() {
        roles.push(RoleName::User.as_str().to_string());
    }
    roles
}

async fn ensure_available(
    conn: &mut PgConnection,
    user_name: Option<&str>,
    email: Option<&str>,
    except_id: Option<i64>,
) -> HttpResult<()> {
    if let Some(name) = user_name {
        if users::identity_taken(&mut *conn, Some(name), None, except_id).await? {
            return Err(username_taken());
        }
    }
    if let Some(email) = email {
        if users::identity_taken(&mut *conn, None, Some(email), except_id).await? {
            return Err(email_taken());
        }
    }
    Ok(())
}

/// Create a user with the given roles. Name and email are normalized first.
pub async fn register(
    conn: &mut PgConnection,
    passwords: &PasswordManager,
    user_name: &str,
    email: &str,
    password: &str,
    roles: &[String],
) -> HttpResult<UserWithRoles> {
    let user_name = normalize_identity(user_name);
    let email = normalize_identity(email);
    ensure_available(&mut *conn, Some(&user_name), Some(&email), None).await?;

    let hash = passwords.hash_async(password).await?;
    let user = users::insert(
        &mut *conn,
        &NewUser {
            user_name,
            email,
            password: hash,
        },
    )
    .await?;

    for role in roles {
        users::assign_role(&mut *conn, user.id, role).await?;
    }
    tracing::info!(user_id = user.id, roles = ?roles, "User registered");

    let roles = users::roles_for(&mut *conn, user.id).await?;
    Ok(UserWithRoles { user, roles })
}

/// Apply name/email changes and, when `roles` is given, replace the role set
pub async fn update(
    conn: &mut PgConnection,
    user_id: i64,
    changes: UserChanges,
    roles: Option<Vec<String>>,
) -> HttpResult<UserWithRoles> {
    if users::find_by_id(&mut *conn, user_id).await?.is_none() {
        return Err(HttpError::not_found("user"));
    }

    let changes = UserChanges {
        user_name: changes.user_name.as_deref().map(normalize_identity),
        email: changes.email.as_deref().map(normalize_identity),
    };
    ensure_available(
        &mut *conn,
        changes.user_name.as_deref(),
        changes.email.as_deref(),
        Some(user_id),
    )
    .await?;

    if !changes.is_empty() {
        users::update(&mut *conn, user_id, &changes).await?;
    }
    if let Some(roles) = roles {
        users::sync_roles(&mut *conn, user_id, &canonical_roles(Some(&roles))).await?;
    }

    users::find_with_roles(conn, user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("user"))
}
