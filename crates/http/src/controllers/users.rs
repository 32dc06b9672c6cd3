//! `/user`: self-service profile and order history

use crate::error::HttpResult;
use crate::extract::{AuthUser, JsonBody};
use crate::resources::{AddressResource, OrderResource, ProfileResource, UserResource};
use crate::services::{accounts, orders};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use bookstore_orm::models::UserChanges;
use bookstore_orm::repositories::{addresses, orders as order_repo};
use bookstore_validation::{EmailValidator, LengthValidator, Rules};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileChanges {
    user_name: Option<String>,
    email: Option<String>,
}

fn profile_rules() -> Rules {
    Rules::new()
        .field("userName", LengthValidator::new().range(2, 20))
        .field("email", EmailValidator::new())
        .field("email", LengthValidator::new().max(50))
}

/// `GET /user/me`
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<ProfileResource>> {
    let saved = addresses::list_for_user(&state.pool, auth.id()).await?;
    let created_at = auth.user.created_at;

    Ok(Json(ProfileResource {
        user: UserResource::new(auth.user, auth.roles),
        created_at,
        addresses: saved.into_iter().map(AddressResource::from).collect(),
    }))
}

/// `GET /user/my-orders`
pub async fn my_orders(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<Vec<OrderResource>>> {
    let mut conn = state.pool.acquire().await?;
    let list = order_repo::list_by_email(&mut *conn, &auth.user.email).await?;
    Ok(Json(orders::resources(&mut conn, list).await?))
}

/// `PATCH /user/me`
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    body: JsonBody,
) -> HttpResult<Json<UserResource>> {
    profile_rules().validate(body.value()).await?;
    let input: ProfileChanges = body.parse()?;

    let mut tx = state.pool.begin().await?;
    let updated = accounts::update(
        &mut tx,
        auth.id(),
        UserChanges {
            user_name: input.user_name,
            email: input.email,
        },
        None,
    )
    .await?;
    tx.commit().await?;
    tracing::info!(user_id = auth.id(), "Profile updated");

    Ok(Json(UserResource::new(updated.user, updated.roles)))
}
