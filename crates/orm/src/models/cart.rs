use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One cart per user
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    /// Sum of `book_price * quantity` over the lines
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item joined with the book it refers to
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub book_id: i64,
    pub quantity: i32,
    pub discount: f64,
    /// Discounted unit price captured when the book was added
    pub book_price: f64,
    pub title: String,
    pub author: String,
    pub image_url: Option<String>,
    /// Current stock of the book
    pub stock: i32,
}

impl CartLine {
    /// `book_price * quantity`
    pub fn line_total(&self) -> f64 {
        self.book_price * f64::from(self.quantity)
    }
}
