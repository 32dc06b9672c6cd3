//! `/payments/vnpay`: checkout, browser return and gateway notification

use crate::controllers::orders::address_id_rules;
use crate::error::HttpResult;
use crate::extract::{AuthUser, ClientIp, JsonBody};
use crate::services::checkout::{self, CheckoutSession};
use crate::services::ipn;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookstore_payments::IpnReply;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayment {
    address_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnQuery {
    #[serde(rename = "vnp_TxnRef", default)]
    txn_ref: Option<String>,
}

/// `POST /payments/vnpay/create`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ClientIp(ip): ClientIp,
    body: JsonBody,
) -> HttpResult<Json<CheckoutSession>> {
    let body = body.coerce_numbers(&["addressId"]);
    address_id_rules().validate(body.value()).await?;
    let input: CreatePayment = body.parse()?;

    let session = checkout::create_vnpay_checkout(&state, &auth.user, input.address_id, &ip).await?;
    Ok(Json(session))
}

/// `GET /payments/vnpay/return`: hand the browser back to the storefront,
/// which polls the order for its real status
pub async fn return_url(State(state): State<AppState>, Query(query): Query<ReturnQuery>) -> impl IntoResponse {
    let txn_ref = query.txn_ref.unwrap_or_default();
    let location = checkout::return_redirect_url(&state.config.frontend_base(), &txn_ref);
    tracing::debug!(target: "vnpay.return", txn_ref = %txn_ref, "Redirecting to storefront");

    (StatusCode::FOUND, [(LOCATION, location)])
}

/// `GET /payments/vnpay/ipn`: always 200, the outcome is in the body
pub async fn ipn(State(state): State<AppState>, Query(params): Query<Vec<(String, String)>>) -> Json<IpnReply> {
    Json(ipn::handle(&state.pool, &state.vnpay, params).await)
}
