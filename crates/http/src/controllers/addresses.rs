//! `/addresses`: the caller's delivery addresses

use crate::error::{HttpError, HttpResult};
use crate::extract::{parse_id, AuthUser, JsonBody};
use crate::resources::AddressResource;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookstore_orm::models::{AddressChanges, AddressInput};
use bookstore_orm::repositories::addresses;
use bookstore_validation::{LengthValidator, RequiredValidator, Rules};
use serde_json::json;

const MIN_LENGTHS: &[(&str, usize)] = &[
    ("street", 5),
    ("buildingName", 5),
    ("city", 4),
    ("state", 2),
    ("country", 2),
    ("pincode", 5),
];

fn address_rules(required: bool) -> Rules {
    MIN_LENGTHS.iter().fold(Rules::new(), |rules, (field, min)| {
        let rules = if required {
            rules.field(*field, RequiredValidator::new())
        } else {
            rules
        };
        rules.field(*field, LengthValidator::new().range(*min, 255))
    })
}

fn address_not_found() -> HttpError {
    HttpError::not_found("address")
}

/// `GET /addresses`
pub async fn index(State(state): State<AppState>, auth: AuthUser) -> HttpResult<impl IntoResponse> {
    let list = addresses::list_for_user(&state.pool, auth.id()).await?;
    let data: Vec<AddressResource> = list.into_iter().map(AddressResource::from).collect();
    Ok(Json(json!({ "data": data })))
}

/// `POST /addresses`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    address_rules(true).validate(body.value()).await?;
    let input: AddressInput = body.parse()?;

    let address = addresses::create(&state.pool, auth.id(), &input).await?;
    tracing::info!(user_id = auth.id(), address_id = address.id, "Address created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": AddressResource::from(address) })),
    ))
}

/// `PATCH /addresses/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    let id = parse_id(&id, "addressId")?;
    address_rules(false).validate(body.value()).await?;
    let changes: AddressChanges = body.parse()?;

    let address = addresses::update(&state.pool, id, auth.id(), &changes)
        .await?
        .ok_or_else(address_not_found)?;

    Ok(Json(json!({ "data": AddressResource::from(address) })))
}

/// `DELETE /addresses/:id`
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> HttpResult<impl IntoResponse> {
    let id = parse_id(&id, "addressId")?;
    if !addresses::delete(&state.pool, id, auth.id()).await? {
        return Err(address_not_found());
    }
    tracing::info!(user_id = auth.id(), address_id = id, "Address deleted");

    Ok(Json(json!({ "message": "Address deleted successfully" })))
}
