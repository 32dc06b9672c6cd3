use bookstore_core::money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of `books`
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    /// List price before discount
    pub price: f64,
    pub publisher: String,
    pub publication_date: NaiveDate,
    pub language: String,
    /// Minimum recommended reader age
    pub reading_age: i32,
    pub pages: i32,
    pub dimension: Option<String>,
    /// Copies in stock
    pub quantity: i32,
    /// Percentage, 0 to 100
    pub discount: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Unit price after discount, rounded to cents
    pub fn final_price(&self) -> f64 {
        money::final_price(self.price, self.discount)
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Body of a book create request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub publisher: String,
    pub publication_date: NaiveDate,
    pub language: String,
    pub reading_age: i32,
    pub pages: i32,
    #[serde(default)]
    pub dimension: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub reading_age: Option<i32>,
    pub pages: Option<i32>,
    pub dimension: Option<String>,
    pub quantity: Option<i32>,
    pub discount: Option<f64>,
    pub image_url: Option<String>,
}
