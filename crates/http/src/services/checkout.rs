//! VNPAY checkout: pending order plus a signed payment URL

use crate::error::HttpResult;
use crate::services::orders::{create_from_cart, prepare_checkout};
use crate::state::AppState;
use bookstore_core::PaymentStatus;
use bookstore_orm::models::{NewPayment, User};
use bookstore_orm::repositories::{orders, payments};
use bookstore_payments::PaymentRequest;
use serde::Serialize;

pub const VNPAY: &str = "VNPAY";

/// Body of a successful `POST /payments/vnpay/create`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub code: &'static str,
    pub message: &'static str,
    /// Signed VNPAY redirect URL
    pub data: String,
    pub order_code: String,
}

/// Create the pending payment and order in one transaction and sign the
/// redirect. Stock and the cart are left alone until the IPN confirms payment.
pub async fn create_vnpay_checkout(
    state: &AppState,
    user: &User,
    address_id: i64,
    ip_addr: &str,
) -> HttpResult<CheckoutSession> {
    let mut tx = state.pool.begin().await?;

    let checkout = prepare_checkout(&mut tx, user.id, address_id).await?;
    let payment = payments::insert(
        &mut *tx,
        &NewPayment {
            payment_method: VNPAY.to_string(),
            pg_status: Some(PaymentStatus::Pending.as_str().to_string()),
            pg_name: Some(VNPAY.to_string()),
            ..NewPayment::default()
        },
    )
    .await?;
    let order = create_from_cart(&mut tx, &user.email, &checkout, &payment, PaymentStatus::Pending).await?;
    let order_code = order.order_code.clone().unwrap_or_default();

    tracing::info!(target: "vnpay.create", amount_usd = order.total_amount, "Converting order total");
    let amount_vnd = state.fx.convert(order.total_amount).await?;
    tracing::info!(target: "vnpay.create", amount_usd = order.total_amount, amount_vnd, "Converted order total");

    orders::set_amount_vnd(&mut *tx, order.id, amount_vnd).await?;
    payments::set_amount(&mut *tx, payment.id, amount_vnd).await?;

    let url = state
        .vnpay
        .payment_url(&PaymentRequest::for_order(&order_code, amount_vnd, ip_addr))?;

    tx.commit().await?;

    tracing::info!(
        target: "vnpay.create",
        user_id = user.id,
        order_id = order.id,
        order_code = %order_code,
        "VNPAY checkout created"
    );

    Ok(CheckoutSession {
        code: "00",
        message: "success",
        data: url,
        order_code,
    })
}

/// Storefront page the browser lands on after the VNPAY return redirect
pub fn return_redirect_url(frontend_base: &str, txn_ref: &str) -> String {
    format!(
        "{}/checkout/vnpay/result?orderCode={}",
        frontend_base.trim_end_matches('/'),
        bookstore_payments::vnpay::form_urlencode(txn_ref)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_redirect_url() {
        assert_eq!(
            return_redirect_url("https://shop.example.com/", "ORD20250101-00000001-AB12"),
            "https://shop.example.com/checkout/vnpay/result?orderCode=ORD20250101-00000001-AB12"
        );
        assert_eq!(
            return_redirect_url("", "a b"),
            "/checkout/vnpay/result?orderCode=a+b"
        );
    }

    #[test]
    fn test_session_serializes_order_code_in_camel_case() {
        let session = CheckoutSession {
            code: "00",
            message: "success",
            data: "https://pay.example/?x=1".to_string(),
            order_code: "ORD1".to_string(),
        };
        let value = serde_json::to_value(session).unwrap();
        assert_eq!(value["orderCode"], "ORD1");
        assert_eq!(value["code"], "00");
    }
}
