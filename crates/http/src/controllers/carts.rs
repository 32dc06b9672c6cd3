//! `/carts`: the caller's shopping cart

use crate::error::HttpResult;
use crate::extract::{parse_id, AuthUser};
use crate::resources::CartResource;
use crate::services::cart::{self, QuantityOperation};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookstore_orm::repositories::carts;
use serde_json::json;

/// `POST /carts/books/:bookId/quantity/:quantity`
pub async fn add_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, quantity)): Path<(String, String)>,
) -> HttpResult<impl IntoResponse> {
    let book_id = parse_id(&book_id, "bookId")?;
    let quantity = parse_id(&quantity, "quantity")?;
    let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);

    let mut tx = state.pool.begin().await?;
    let resource = cart::add_book(&mut tx, auth.id(), book_id, quantity).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(resource)))
}

/// `GET /carts/users/cart`
pub async fn show(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<CartResource>> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(cart::load(&mut conn, auth.id()).await?))
}

/// `PATCH /carts/book/:bookId/quantity/:operation`
pub async fn change_quantity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((book_id, operation)): Path<(String, String)>,
) -> HttpResult<Json<CartResource>> {
    let book_id = parse_id(&book_id, "bookId")?;
    let operation: QuantityOperation = operation.parse()?;

    let mut tx = state.pool.begin().await?;
    let resource = cart::change_quantity(&mut tx, auth.id(), book_id, operation).await?;
    tx.commit().await?;

    Ok(Json(resource))
}

/// `DELETE /carts/book/:bookId`
pub async fn remove_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(book_id): Path<String>,
) -> HttpResult<Json<CartResource>> {
    let book_id = parse_id(&book_id, "bookId")?;

    let mut tx = state.pool.begin().await?;
    let resource = cart::remove_book(&mut tx, auth.id(), book_id).await?;
    tx.commit().await?;

    Ok(Json(resource))
}

/// `GET /carts/total-items`
pub async fn total_items(State(state): State<AppState>, auth: AuthUser) -> HttpResult<impl IntoResponse> {
    let total = carts::total_items(&state.pool, auth.id()).await?;
    Ok(Json(json!({ "totalItems": total })))
}
