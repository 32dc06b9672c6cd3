//! `/order` and `/orders`: checkout without a redirecting gateway, order lookup, fulfilment

use crate::error::{HttpError, HttpResult};
use crate::extract::{parse_id, AuthUser, JsonBody};
use crate::resources::OrderResource;
use crate::services::orders::{self, PlaceOrder};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookstore_core::{OrderStatus, PaymentStatus};
use bookstore_orm::repositories::orders as order_repo;
use bookstore_validation::{NumericValidator, RequiredValidator, Rules};

pub(crate) fn order_not_found() -> HttpError {
    HttpError::not_found("order")
}

pub(crate) fn address_id_rules() -> Rules {
    Rules::new()
        .field("addressId", RequiredValidator::new())
        .field("addressId", NumericValidator::new().integer_only().min(1.0))
}

fn status_rules(field: &str) -> Rules {
    Rules::new().field(field, RequiredValidator::new())
}

/// Parse an order status and check it against the statuses the caller may set
pub(crate) fn order_status_in(raw: &str, allowed: &[OrderStatus]) -> HttpResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .ok()
        .filter(|status| allowed.contains(status))
        .ok_or_else(|| {
            let names: Vec<&str> = allowed.iter().map(OrderStatus::as_str).collect();
            HttpError::bad_request("Invalid order status")
                .with_error("orderStatus", format!("Allowed: {}", names.join(", ")))
        })
}

pub(crate) fn payment_status(raw: &str) -> HttpResult<PaymentStatus> {
    raw.parse::<PaymentStatus>().map_err(|_| {
        HttpError::bad_request("Invalid payment status")
            .with_error("paymentStatus", "Allowed: PENDING, PAID, FAILED, SUCCESS")
    })
}

/// Read a required status string from the body
pub(crate) async fn status_field(body: &JsonBody, field: &str) -> HttpResult<String> {
    status_rules(field).validate(body.value()).await?;
    body.value()
        .get(field)
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            HttpError::unprocessable("Validation failed").with_error(field, format!("{} must be a string", field))
        })
}

/// `POST /order/users/payments/:paymentMethod`
pub async fn place_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payment_method): Path<String>,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    let body = body.coerce_numbers(&["addressId"]);
    address_id_rules().validate(body.value()).await?;
    let input: PlaceOrder = body.parse()?;

    let mut tx = state.pool.begin().await?;
    let order = orders::place_order(&mut tx, &auth.user, &payment_method, input).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = auth.id(),
        order_id = order.order_id,
        payment_method = %payment_method,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /order` (staff)
pub async fn index(State(state): State<AppState>, auth: AuthUser) -> HttpResult<Json<Vec<OrderResource>>> {
    auth.require_staff()?;
    let mut conn = state.pool.acquire().await?;
    let list = order_repo::list(&mut *conn).await?;
    Ok(Json(orders::resources(&mut conn, list).await?))
}

/// `GET /order/:id` (staff)
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> HttpResult<Json<OrderResource>> {
    auth.require_staff()?;
    let id = parse_id(&id, "id")?;
    let mut conn = state.pool.acquire().await?;
    Ok(Json(orders::find_resource(&mut conn, id).await?))
}

/// `PATCH /order/:id/status` (staff): fulfilment steps only
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: JsonBody,
) -> HttpResult<Json<OrderResource>> {
    let raw = status_field(&body, "orderStatus").await?;
    auth.require_staff()?;
    let status = order_status_in(&raw, &[OrderStatus::Shipping, OrderStatus::Completed])?;
    let id = parse_id(&id, "id")?;

    let mut conn = state.pool.acquire().await?;
    let order = order_repo::set_order_status(&mut *conn, id, status)
        .await?
        .ok_or_else(order_not_found)?;
    tracing::info!(order_id = id, status = %status, staff_id = auth.id(), "Order status changed");

    Ok(Json(orders::resource(&mut conn, order).await?))
}

/// `GET /orders/by-code/:code`: staff, or the user who placed the order
pub async fn by_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> HttpResult<Json<OrderResource>> {
    let mut conn = state.pool.acquire().await?;
    let order = order_repo::find_by_code(&mut *conn, code.trim())
        .await?
        .ok_or_else(order_not_found)?;

    if !auth.is_staff() && order.email != auth.user.email {
        return Err(HttpError::forbidden("Insufficient permissions."));
    }

    Ok(Json(orders::resource(&mut conn, order).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_staff_may_only_ship_or_complete() {
        let allowed = [OrderStatus::Shipping, OrderStatus::Completed];
        assert_eq!(order_status_in("shipping", &allowed).unwrap(), OrderStatus::Shipping);

        let err = order_status_in("CANCELLED", &allowed).unwrap_err();
        assert_eq!(err.message(), "Invalid order status");
        assert_eq!(err.errors()["orderStatus"], vec!["Allowed: SHIPPING, COMPLETED"]);
    }

    #[test]
    fn test_payment_status() {
        assert_eq!(payment_status(" paid ").unwrap(), PaymentStatus::Paid);
        assert_eq!(payment_status("REFUNDED").unwrap_err().message(), "Invalid payment status");
    }

    #[tokio::test]
    async fn test_address_id_rules() {
        assert!(address_id_rules().validate(&json!({"addressId": 3})).await.is_ok());
        assert!(address_id_rules().validate(&json!({"addressId": 0})).await.is_err());
        assert!(address_id_rules().validate(&json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_status_field_requires_a_string() {
        let body = JsonBody(json!({"orderStatus": 5}));
        assert!(status_field(&body, "orderStatus").await.is_err());

        let body = JsonBody(json!({"orderStatus": "shipping"}));
        assert_eq!(status_field(&body, "orderStatus").await.unwrap(), "shipping");
    }
}
