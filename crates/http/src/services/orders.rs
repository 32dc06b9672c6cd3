//! Turning carts into orders and loading orders for display

use crate::error::{HttpError, HttpResult};
use crate::resources::OrderResource;
use bookstore_core::{OrderStatus, PaymentStatus};
use bookstore_orm::models::{Address, Cart, CartLine, NewOrder, NewPayment, Order, Payment, User};
use bookstore_orm::repositories::{addresses, books, carts, orders, payments};
use bookstore_orm::PgConnection;
use chrono::Utc;
use serde::Deserialize;

/// Optional gateway details sent with `POST /order/users/payments/:paymentMethod`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub address_id: i64,
    pub pg_name: Option<String>,
    pub pg_payment_id: Option<String>,
    pub pg_status: Option<String>,
    pub pg_response_message: Option<String>,
}

/// A non-empty cart and a delivery address owned by the same user
pub struct Checkout {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    pub address: Address,
}

/// Load the user's cart and address for checkout
pub async fn prepare_checkout(conn: &mut PgConnection, user_id: i64, address_id: i64) -> HttpResult<Checkout> {
    let cart = carts::find_by_user(&mut *conn, user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("cart"))?;
    let lines = carts::lines(&mut *conn, cart.id).await?;
    if lines.is_empty() {
        return Err(HttpError::bad_request("Cart is empty").with_error("cart", "Your cart is empty."));
    }

    let address = addresses::find_for_user(&mut *conn, address_id, user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("address"))?;

    Ok(Checkout { cart, lines, address })
}

/// Insert the order with a fresh code and copy the cart lines onto it
pub async fn create_from_cart(
    conn: &mut PgConnection,
    email: &str,
    checkout: &Checkout,
    payment: &Payment,
    payment_status: PaymentStatus,
) -> HttpResult<Order> {
    let total = carts::recalculate_total(&mut *conn, checkout.cart.id).await?;
    let today = Utc::now().date_naive();

    let order = orders::insert(
        &mut *conn,
        &NewOrder {
            email: email.to_string(),
            order_date: today,
            payment_id: payment.id,
            address_id: checkout.address.id,
            total_amount: total,
            order_status: OrderStatus::Accepted,
            payment_status,
        },
    )
    .await?;
    let code = orders::assign_code(&mut *conn, order.id, today).await?;

    for line in &checkout.lines {
        orders::add_item(
            &mut *conn,
            order.id,
            line.book_id,
            line.quantity,
            line.discount,
            line.book_price,
        )
        .await?;
    }

    tracing::info!(
        order_id = order.id,
        order_code = %code,
        payment_id = payment.id,
        total,
        items = checkout.lines.len(),
        "Order created"
    );

    Ok(Order {
        order_code: Some(code),
        ..order
    })
}

/// Lock every book in the cart and refuse lines that exceed stock
async fn reserve_stock(conn: &mut PgConnection, lines: &[CartLine]) -> HttpResult<()> {
    for line in lines {
        let book = books::find_for_update(&mut *conn, line.book_id)
            .await?
            .ok_or_else(|| {
                HttpError::bad_request("Invalid cart item")
                    .with_error("book", "A book in your cart no longer exists.")
            })?;

        if line.quantity > book.quantity {
            return Err(HttpError::bad_request(format!("Insufficient stock for {}", book.title))
                .with_error("stock", format!("Only {} of {} left.", book.quantity, book.title)));
        }
    }
    Ok(())
}

/// Checkout for gateways settled outside VNPAY: stock is taken and the cart emptied immediately
pub async fn place_order(
    conn: &mut PgConnection,
    user: &User,
    payment_method: &str,
    input: PlaceOrder,
) -> HttpResult<OrderResource> {
    let checkout = prepare_checkout(&mut *conn, user.id, input.address_id).await?;
    reserve_stock(&mut *conn, &checkout.lines).await?;

    let payment = payments::insert(
        &mut *conn,
        &NewPayment {
            payment_method: payment_method.trim().to_string(),
            pg_payment_id: input.pg_payment_id,
            pg_status: input.pg_status,
            pg_response_message: input.pg_response_message,
            pg_name: input.pg_name,
        },
    )
    .await?;
    let order = create_from_cart(&mut *conn, &user.email, &checkout, &payment, PaymentStatus::Pending).await?;

    for line in &checkout.lines {
        if !books::decrement_stock(&mut *conn, line.book_id, line.quantity).await? {
            return Err(HttpError::bad_request(format!("Insufficient stock for {}", line.title))
                .with_error("stock", format!("Not enough copies of {}.", line.title)));
        }
    }
    carts::clear(&mut *conn, checkout.cart.id).await?;

    let lines = orders::lines(&mut *conn, order.id).await?;
    Ok(OrderResource::new(order, Some(payment), lines))
}

pub async fn resource(conn: &mut PgConnection, order: Order) -> HttpResult<OrderResource> {
    let payment = match order.payment_id {
        Some(id) => payments::find(&mut *conn, id).await?,
        None => None,
    };
    let lines = orders::lines(&mut *conn, order.id).await?;
    Ok(OrderResource::new(order, payment, lines))
}

/// Batch version of [`resource`]: two queries regardless of the order count
pub async fn resources(conn: &mut PgConnection, list: Vec<Order>) -> HttpResult<Vec<OrderResource>> {
    let order_ids: Vec<i64> = list.iter().map(|order| order.id).collect();
    let payment_ids: Vec<i64> = list.iter().filter_map(|order| order.payment_id).collect();

    let mut lines = orders::lines_for_orders(&mut *conn, &order_ids).await?;
    let mut payments = payments::find_many(&mut *conn, &payment_ids).await?;

    Ok(list
        .into_iter()
        .map(|order| {
            let payment = order.payment_id.and_then(|id| payments.remove(&id));
            let order_lines = lines.remove(&order.id).unwrap_or_default();
            OrderResource::new(order, payment, order_lines)
        })
        .collect())
}

pub async fn find_resource(conn: &mut PgConnection, id: i64) -> HttpResult<OrderResource> {
    let order = orders::find(&mut *conn, id)
        .await?
        .ok_or_else(|| HttpError::not_found("order"))?;
    resource(conn, order).await
}
