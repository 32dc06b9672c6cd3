use crate::error::{ModelError, ModelResult};
use crate::models::{NewUser, User, UserChanges, UserWithRoles};
use crate::repositories::contains_pattern;
use bookstore_core::RoleName;
use sqlx::{PgConnection, PgExecutor};
use std::collections::HashMap;

const USER_COLUMNS: &str = "u.id, u.user_name, u.email, u.password, u.created_at, u.updated_at";

/// Which slice of the user base a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserGroup {
    All,
    Customers,
    Employees,
}

impl UserGroup {
    /// Upper-cased role names that place a user in the group
    fn role_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            UserGroup::All => &[],
            UserGroup::Customers => &["USER", "ROLE_USER"],
            UserGroup::Employees => &["EMPLOYEE", "EMPLOYEES", "ROLE_EMPLOYEE"],
        };
        names.iter().map(|name| name.to_string()).collect()
    }
}

pub async fn find_by_id<'e, E>(db: E, id: i64) -> ModelResult<Option<User>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(db).await?)
}

pub async fn find_by_user_name<'e, E>(db: E, user_name: &str) -> ModelResult<Option<User>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM users u WHERE u.user_name = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(user_name)
        .fetch_optional(db)
        .await?)
}

pub async fn find_by_email<'e, E>(db: E, email: &str) -> ModelResult<Option<User>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM users u WHERE u.email = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(db).await?)
}

/// True when another user (not `except_id`) already holds the name or email
pub async fn identity_taken<'e, E>(
    db: E,
    user_name: Option<&str>,
    email: Option<&str>,
    except_id: Option<i64>,
) -> ModelResult<bool>
where
    E: PgExecutor<'e>,
{
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM users
            WHERE (user_name = $1 OR email = $2)
              AND ($3::bigint IS NULL OR id <> $3)
        )",
    )
    .bind(user_name)
    .bind(email)
    .bind(except_id)
    .fetch_one(db)
    .await?;
    Ok(taken)
}

/// Role names of one user, sorted
pub async fn roles_for<'e, E>(db: E, user_id: i64) -> ModelResult<Vec<String>>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM roles r
         JOIN role_user ru ON ru.role_id = r.id
         WHERE ru.user_id = $1
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?)
}

/// Role names for many users at once, keyed by user id
pub async fn roles_for_users<'e, E>(db: E, user_ids: &[i64]) -> ModelResult<HashMap<i64, Vec<String>>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT ru.user_id, r.name FROM role_user ru
         JOIN roles r ON r.id = ru.role_id
         WHERE ru.user_id = ANY($1)
         ORDER BY ru.user_id, r.name",
    )
    .bind(user_ids)
    .fetch_all(db)
    .await?;

    let mut roles: HashMap<i64, Vec<String>> = HashMap::new();
    for (user_id, name) in rows {
        roles.entry(user_id).or_default().push(name);
    }
    Ok(roles)
}

/// Load a user and its roles in one call
pub async fn find_with_roles(conn: &mut PgConnection, id: i64) -> ModelResult<Option<UserWithRoles>> {
    let Some(user) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    let roles = roles_for(&mut *conn, id).await?;
    Ok(Some(UserWithRoles { user, roles }))
}

pub async fn insert<'e, E>(db: E, user: &NewUser) -> ModelResult<User>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_as::<_, User>(
        "INSERT INTO users (user_name, email, password)
         VALUES ($1, $2, $3)
         RETURNING id, user_name, email, password, created_at, updated_at",
    )
    .bind(&user.user_name)
    .bind(&user.email)
    .bind(&user.password)
    .fetch_one(db)
    .await?)
}

/// Id of the role with the canonical form of `name`, creating it if needed
pub async fn ensure_role(conn: &mut PgConnection, name: &str) -> ModelResult<i64> {
    let canonical = RoleName::canonical(name);
    if canonical.is_empty() {
        return Err(ModelError::query("Role name cannot be empty"));
    }

    sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(&canonical)
        .execute(&mut *conn)
        .await?;

    Ok(sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = $1")
        .bind(&canonical)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn assign_role(conn: &mut PgConnection, user_id: i64, name: &str) -> ModelResult<()> {
    let role_id = ensure_role(conn, name).await?;
    sqlx::query("INSERT INTO role_user (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Replace the user's roles with exactly `names`
pub async fn sync_roles(conn: &mut PgConnection, user_id: i64, names: &[String]) -> ModelResult<()> {
    sqlx::query("DELETE FROM role_user WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    for name in names {
        assign_role(conn, user_id, name).await?;
    }
    Ok(())
}

pub async fn update<'e, E>(db: E, id: i64, changes: &UserChanges) -> ModelResult<User>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            user_name = COALESCE($2, user_name),
            email = COALESCE($3, email),
            updated_at = NOW()
         WHERE id = $1
         RETURNING id, user_name, email, password, created_at, updated_at",
    )
    .bind(id)
    .bind(changes.user_name.as_deref())
    .bind(changes.email.as_deref())
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ModelError::not_found("users"))
}

/// Store a new password hash
pub async fn update_password<'e, E>(db: E, id: i64, password_hash: &str) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ModelError::not_found("users"));
    }
    Ok(())
}

/// Delete a user; returns false when no such user existed
pub async fn delete<'e, E>(db: E, id: i64) -> ModelResult<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Users in `group`, optionally filtered by a case-insensitive user name fragment
pub async fn list<'e, E>(db: E, group: UserGroup, search: Option<&str>) -> ModelResult<Vec<User>>
where
    E: PgExecutor<'e>,
{
    let pattern = search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| contains_pattern(&term.to_lowercase()));

    let sql = format!(
        "SELECT {} FROM users u
         WHERE ($1::text IS NULL OR LOWER(u.user_name) LIKE $1)
           AND (cardinality($2::text[]) = 0 OR EXISTS (
                SELECT 1 FROM role_user ru
                JOIN roles r ON r.id = ru.role_id
                WHERE ru.user_id = u.id AND UPPER(r.name) = ANY($2)
           ))
         ORDER BY u.id",
        USER_COLUMNS
    );

    Ok(sqlx::query_as::<_, User>(&sql)
        .bind(pattern)
        .bind(group.role_names())
        .fetch_all(db)
        .await?)
}

pub async fn count<'e, E>(db: E, group: UserGroup) -> ModelResult<i64>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users u
         WHERE cardinality($1::text[]) = 0 OR EXISTS (
            SELECT 1 FROM role_user ru
            JOIN roles r ON r.id = ru.role_id
            WHERE ru.user_id = u.id AND UPPER(r.name) = ANY($1)
         )",
    )
    .bind(group.role_names())
    .fetch_one(db)
    .await?)
}
