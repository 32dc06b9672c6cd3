//! `/manage`: the admin back office

use crate::controllers::books;
use crate::controllers::orders::{order_not_found, order_status_in, payment_status, status_field};
use crate::error::{HttpError, HttpResult};
use crate::extract::{parse_id, AuthUser, JsonBody};
use crate::resources::{BookResource, OrderResource, Paginated, UserResource};
use crate::services::{accounts, orders};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_core::OrderStatus;
use bookstore_orm::models::{User, UserChanges};
use bookstore_orm::repositories::{orders as order_repo, stats, users};
use bookstore_orm::{DashboardStats, PgPool, UserGroup};
use bookstore_validation::{
    CustomValidator, EmailValidator, LengthValidator, NumericValidator, RequiredValidator, Rules,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUser {
    user_name: String,
    email: String,
    password: String,
    roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUser {
    updated_user_id: i64,
    user_name: Option<String>,
    email: Option<String>,
    roles: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTerm {
    #[serde(default)]
    search_term: Option<String>,
}

fn role_list_rule() -> CustomValidator {
    CustomValidator::new("roles", "Each role must be a string of 2 to 50 characters", |value: &Value| {
        value.as_array().is_some_and(|roles| {
            roles.iter().all(|role| {
                role.as_str()
                    .map(|name| (2..=50).contains(&name.trim().chars().count()))
                    .unwrap_or(false)
            })
        })
    })
}

fn create_user_rules() -> Rules {
    Rules::new()
        .field("userName", RequiredValidator::new())
        .field("userName", LengthValidator::new().range(2, 20))
        .field("email", RequiredValidator::new())
        .field("email", EmailValidator::new())
        .field("email", LengthValidator::new().max(50))
        .field("password", RequiredValidator::new())
        .field("password", LengthValidator::new().range(6, 100))
        .field("roles", role_list_rule())
}

fn update_user_rules() -> Rules {
    Rules::new()
        .field("updatedUserId", RequiredValidator::new())
        .field("updatedUserId", NumericValidator::new().integer_only().min(1.0))
        .field("userName", LengthValidator::new().range(2, 20))
        .field("email", EmailValidator::new())
        .field("email", LengthValidator::new().max(50))
        .field("roles", role_list_rule())
}

async fn user_resources(pool: &PgPool, list: Vec<User>) -> HttpResult<Vec<UserResource>> {
    let ids: Vec<i64> = list.iter().map(|user| user.id).collect();
    let mut roles = users::roles_for_users(pool, &ids).await?;
    Ok(list
        .into_iter()
        .map(|user| {
            let user_roles = roles.remove(&user.id).unwrap_or_default();
            UserResource::new(user, user_roles)
        })
        .collect())
}

async fn list_group(
    state: &AppState,
    auth: &AuthUser,
    group: UserGroup,
    term: Option<&str>,
) -> HttpResult<Json<Vec<UserResource>>> {
    auth.require_admin()?;
    let list = users::list(&state.pool, group, term).await?;
    Ok(Json(user_resources(&state.pool, list).await?))
}

/// `GET /manage/dashboard/stats`
pub async fn dashboard_stats(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<DashboardStats>> {
    auth.require_admin()?;
    let mut conn = state.pool.acquire().await?;
    Ok(Json(stats::dashboard(&mut conn).await?))
}

pub async fn all_users(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<Vec<UserResource>>> {
    list_group(&state, &auth, UserGroup::All, None).await
}

pub async fn all_customers(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<Vec<UserResource>>> {
    list_group(&state, &auth, UserGroup::Customers, None).await
}

pub async fn all_employees(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<Vec<UserResource>>> {
    list_group(&state, &auth, UserGroup::Employees, None).await
}

pub async fn search_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchTerm>,
) -> HttpResult<Json<Vec<UserResource>>> {
    list_group(&state, &auth, UserGroup::All, query.search_term.as_deref()).await
}

pub async fn search_customers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchTerm>,
) -> HttpResult<Json<Vec<UserResource>>> {
    list_group(&state, &auth, UserGroup::Customers, query.search_term.as_deref()).await
}

pub async fn search_employees(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchTerm>,
) -> HttpResult<Json<Vec<UserResource>>> {
    list_group(&state, &auth, UserGroup::Employees, query.search_term.as_deref()).await
}

/// `POST /manage/user`
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    create_user_rules().validate(body.value()).await?;
    auth.require_admin()?;
    let input: CreateUser = body.parse()?;

    let roles = accounts::canonical_roles(input.roles.as_deref());
    let mut tx = state.pool.begin().await?;
    let created = accounts::register(
        &mut tx,
        &state.passwords,
        &input.user_name,
        &input.email,
        &input.password,
        &roles,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(user_id = created.id(), admin_id = auth.id(), "User created by admin");

    Ok((StatusCode::CREATED, Json(UserResource::new(created.user, created.roles))))
}

/// `PATCH /manage/user`
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    body: JsonBody,
) -> HttpResult<Json<UserResource>> {
    let body = body.coerce_numbers(&["updatedUserId"]);
    update_user_rules().validate(body.value()).await?;
    auth.require_admin()?;
    let input: UpdateUser = body.parse()?;

    let mut tx = state.pool.begin().await?;
    let updated = accounts::update(
        &mut tx,
        input.updated_user_id,
        UserChanges {
            user_name: input.user_name,
            email: input.email,
        },
        input.roles,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(user_id = updated.id(), admin_id = auth.id(), "User updated by admin");

    Ok(Json(UserResource::new(updated.user, updated.roles)))
}

/// `DELETE /manage/user/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> HttpResult<StatusCode> {
    auth.require_admin()?;
    let id = parse_id(&id, "id")?;

    if !users::delete(&state.pool, id).await? {
        return Err(HttpError::not_found("user"));
    }
    tracing::info!(user_id = id, admin_id = auth.id(), "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /manage/books`
pub async fn books_index(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Response> {
    auth.require_admin()?;
    books::index(State(state)).await
}

/// `GET /manage/books/book?Id=`
pub async fn book_show(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Query<HashMap<String, String>>,
) -> HttpResult<Response> {
    auth.require_admin()?;
    Ok(books::show(State(state), query).await?.into_response())
}

/// `GET /manage/books/search`
pub async fn books_search(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Query<Vec<(String, String)>>,
) -> HttpResult<Json<Paginated<BookResource>>> {
    auth.require_admin()?;
    books::search(State(state), query).await
}

/// `GET /manage/books/searchTitle?term=`
pub async fn books_search_title(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Query<HashMap<String, String>>,
) -> HttpResult<Response> {
    auth.require_admin()?;
    Ok(books::search_title(State(state), query).await?.into_response())
}

/// `GET /manage/orders`
pub async fn orders_index(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<Vec<OrderResource>>> {
    auth.require_admin()?;
    let mut conn = state.pool.acquire().await?;
    let list = order_repo::list(&mut *conn).await?;
    Ok(Json(orders::resources(&mut conn, list).await?))
}

/// `GET /manage/orders/:id`
pub async fn order_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> HttpResult<Json<OrderResource>> {
    auth.require_admin()?;
    let id = parse_id(&id, "id")?;
    let mut conn = state.pool.acquire().await?;
    Ok(Json(orders::find_resource(&mut conn, id).await?))
}

/// `GET /manage/orders/by-code/:code`
pub async fn order_by_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> HttpResult<Json<OrderResource>> {
    auth.require_admin()?;
    let mut conn = state.pool.acquire().await?;
    let order = order_repo::find_by_code(&mut *conn, code.trim())
        .await?
        .ok_or_else(order_not_found)?;
    Ok(Json(orders::resource(&mut conn, order).await?))
}

/// `GET /manage/orders/search?searchTerm=`
pub async fn orders_search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchTerm>,
) -> HttpResult<Json<Vec<OrderResource>>> {
    auth.require_admin()?;
    let mut conn = state.pool.acquire().await?;
    let term = query.search_term.unwrap_or_default();
    let list = order_repo::search_by_code(&mut *conn, &term).await?;
    Ok(Json(orders::resources(&mut conn, list).await?))
}

/// `PATCH /manage/orders/:id/status`
pub async fn order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: JsonBody,
) -> HttpResult<Json<OrderResource>> {
    let raw = status_field(&body, "orderStatus").await?;
    auth.require_admin()?;
    let status = order_status_in(
        &raw,
        &[
            OrderStatus::Accepted,
            OrderStatus::Shipping,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ],
    )?;
    let id = parse_id(&id, "id")?;

    let mut conn = state.pool.acquire().await?;
    let order = order_repo::set_order_status(&mut *conn, id, status)
        .await?
        .ok_or_else(order_not_found)?;
    tracing::info!(order_id = id, status = %status, admin_id = auth.id(), "Order status changed");

    Ok(Json(orders::resource(&mut conn, order).await?))
}

/// `PATCH /manage/orders/:id/payment-status`
pub async fn order_payment_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: JsonBody,
) -> HttpResult<Json<OrderResource>> {
    let raw = status_field(&body, "paymentStatus").await?;
    auth.require_admin()?;
    let status = payment_status(&raw)?;
    let id = parse_id(&id, "id")?;

    let mut conn = state.pool.acquire().await?;
    let order = order_repo::set_payment_status(&mut *conn, id, status)
        .await?
        .ok_or_else(order_not_found)?;
    tracing::info!(order_id = id, status = %status, admin_id = auth.id(), "Payment status changed");

    Ok(Json(orders::resource(&mut conn, order).await?))
}
