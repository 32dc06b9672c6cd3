use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A row of `payments`; each order points at one
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    /// Stored as the client sent it, trimmed
    pub payment_method: String,
    pub pg_payment_id: Option<String>,
    /// Gateway outcome: `PENDING`, `SUCCESS` or `FAILED` for VNPAY
    pub pg_status: Option<String>,
    pub pg_response_message: Option<String>,
    pub pg_name: Option<String>,
    /// Amount in VND sent to the gateway
    pub pg_amount: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPayment {
    pub payment_method: String,
    pub pg_payment_id: Option<String>,
    pub pg_status: Option<String>,
    pub pg_response_message: Option<String>,
    pub pg_name: Option<String>,
}
