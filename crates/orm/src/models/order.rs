use bookstore_core::{OrderStatus, PaymentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A row of `orders`
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    /// `ORD{YYYYMMDD}-{id:08}-{XXXX}`, assigned right after insert
    pub order_code: Option<String>,
    /// Email of the ordering user
    pub email: String,
    pub order_date: NaiveDate,
    pub payment_id: Option<i64>,
    pub address_id: Option<i64>,
    /// Cart total at checkout, in the store currency
    pub total_amount: f64,
    /// Converted total sent to VNPAY
    pub total_amount_vnd: Option<i64>,
    pub order_status: String,
    pub payment_status: String,
    /// Set when the payment status becomes settled
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Payment status is `PAID`
    pub fn is_paid(&self) -> bool {
        self.payment_status
            .parse::<PaymentStatus>()
            .map(|status| status == PaymentStatus::Paid)
            .unwrap_or(false)
    }
}

/// An order item joined with the (possibly deleted) book
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub book_id: Option<i64>,
    pub quantity: i32,
    pub discount: f64,
    pub ordered_book_price: f64,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

/// Values for a new `orders` row; the code is assigned afterwards
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub email: String,
    pub order_date: NaiveDate,
    pub payment_id: i64,
    pub address_id: i64,
    pub total_amount: f64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
}
