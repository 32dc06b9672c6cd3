//! `/books`: public catalogue reads and admin writes

use crate::error::{HttpError, HttpResult};
use crate::extract::{parse_id, AuthUser, JsonBody};
use crate::resources::{BookResource, Paginated};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_orm::models::{BookChanges, NewBook};
use bookstore_orm::repositories::{book_search, books};
use bookstore_orm::BookSearch;
use bookstore_validation::{
    DateValidator, LengthValidator, NumericValidator, RequiredValidator, Rules, UrlValidator,
};
use serde_json::json;
use std::collections::HashMap;

const NUMERIC_FIELDS: &[&str] = &["price", "readingAge", "pages", "quantity", "discount"];

/// Rules shared by create and update; `required` marks the create-only presence checks
fn book_rules(required: bool) -> Rules {
    let mut rules = Rules::new();
    if required {
        for field in [
            "title",
            "author",
            "description",
            "category",
            "price",
            "publisher",
            "publicationDate",
            "language",
            "readingAge",
            "pages",
        ] {
            rules = rules.field(field, RequiredValidator::new());
        }
    }

    rules
        .field("title", LengthValidator::new().max(255))
        .field("author", LengthValidator::new().max(255))
        .field("description", LengthValidator::new().max(1000))
        .field("category", LengthValidator::new().max(100))
        .field("price", NumericValidator::new().positive_only())
        .field("publisher", LengthValidator::new().max(255))
        .field("publicationDate", DateValidator::new().not_in_future())
        .field("language", LengthValidator::new().max(100))
        .field("readingAge", NumericValidator::new().integer_only().min(0.0))
        .field("pages", NumericValidator::new().integer_only().min(1.0))
        .field("dimension", LengthValidator::new().max(50))
        .field("quantity", NumericValidator::new().integer_only().min(0.0))
        .field("discount", NumericValidator::new().min(0.0))
        .field("imageUrl", UrlValidator::new())
}

fn title_exists() -> HttpError {
    HttpError::unprocessable("Validation failed").with_error("title", "Title already exists")
}

fn book_not_found() -> HttpError {
    HttpError::not_found("book")
}

/// `?Id=` or `?id=`, whichever is present first in `keys`
fn id_param(params: &HashMap<String, String>, keys: &[&str], missing: &str) -> HttpResult<i64> {
    let raw = keys
        .iter()
        .find_map(|key| params.get(*key))
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| HttpError::missing_parameter(missing))?;
    parse_id(raw, "id")
}

/// `GET /books`
pub async fn index(State(state): State<AppState>) -> HttpResult<Response> {
    let list = books::all(&state.pool).await?;
    if list.is_empty() {
        return Ok(Json(json!({ "message": "No record available" })).into_response());
    }

    let data: Vec<BookResource> = list.into_iter().map(BookResource::from).collect();
    Ok(Json(json!({ "data": data })).into_response())
}

/// `GET /books/book?Id=`
pub async fn show(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HttpResult<impl IntoResponse> {
    let id = id_param(&params, &["Id", "id"], "Id")?;
    let book = books::find(&state.pool, id).await?.ok_or_else(book_not_found)?;
    Ok(Json(json!({ "data": BookResource::from(book) })))
}

/// `GET /books/searchTitle?term=`
pub async fn search_title(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> HttpResult<impl IntoResponse> {
    let list = books::search_title(&state.pool, params.get("term").map(String::as_str)).await?;
    let data: Vec<BookResource> = list.into_iter().map(BookResource::from).collect();
    Ok(Json(json!({ "data": data })))
}

/// `GET /books/search`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> HttpResult<Json<Paginated<BookResource>>> {
    let search = BookSearch::from_query(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let mut conn = state.pool.acquire().await?;
    let page = book_search::search(&mut conn, &search).await?;
    Ok(Json(Paginated::from_page(page)))
}

/// `POST /books`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    auth.require_admin()?;

    let body = body.coerce_numbers(NUMERIC_FIELDS);
    book_rules(true).validate(body.value()).await?;
    let input: NewBook = body.parse()?;

    if books::title_taken(&state.pool, &input.title, None).await? {
        return Err(title_exists());
    }

    let book = books::create(&state.pool, &input).await?;
    tracing::info!(book_id = book.id, admin_id = auth.id(), "Book created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Book created successfully",
            "data": BookResource::from(book),
        })),
    ))
}

/// `PATCH /books?id=`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    auth.require_admin()?;
    let id = id_param(&params, &["id", "Id"], "id")?;

    let body = body.coerce_numbers(NUMERIC_FIELDS);
    book_rules(false).validate(body.value()).await?;
    let changes: BookChanges = body.parse()?;

    let mut tx = state.pool.begin().await?;
    let existing = books::find_for_update(&mut *tx, id).await?.ok_or_else(book_not_found)?;

    if let Some(title) = changes.title.as_deref() {
        if title != existing.title && books::title_taken(&mut *tx, title, Some(id)).await? {
            return Err(title_exists());
        }
    }

    let book = books::update(&mut *tx, id, &changes).await?.ok_or_else(book_not_found)?;
    tx.commit().await?;
    tracing::info!(book_id = id, admin_id = auth.id(), "Book updated");

    Ok(Json(json!({ "data": BookResource::from(book) })))
}

/// `DELETE /books?id=`
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> HttpResult<StatusCode> {
    auth.require_admin()?;
    let id = id_param(&params, &["id", "Id"], "id")?;

    let mut tx = state.pool.begin().await?;
    if !books::delete(&mut tx, id).await? {
        return Err(book_not_found());
    }
    tx.commit().await?;
    tracing::info!(book_id = id, admin_id = auth.id(), "Book deleted");

    Ok(StatusCode::NO_CONTENT)
}
