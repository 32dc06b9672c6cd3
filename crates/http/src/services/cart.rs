//! Cart mutations. Callers run each function inside a transaction.

use crate::error::{HttpError, HttpResult};
use crate::resources::CartResource;
use axum::http::StatusCode;
use bookstore_orm::models::Book;
use bookstore_orm::repositories::{books, carts};
use bookstore_orm::PgConnection;
use std::str::FromStr;

/// `PATCH /carts/book/:bookId/quantity/:operation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOperation {
    Add,
    Delete,
}

impl QuantityOperation {
    fn delta(self) -> i32 {
        match self {
            QuantityOperation::Add => 1,
            QuantityOperation::Delete => -1,
        }
    }
}

impl FromStr for QuantityOperation {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(QuantityOperation::Add),
            "delete" => Ok(QuantityOperation::Delete),
            _ => Err(HttpError::bad_request("Invalid operation")
                .with_error("operation", "Allowed: add, delete")),
        }
    }
}

fn cart_not_found() -> HttpError {
    HttpError::not_found("cart")
}

fn not_in_cart() -> HttpError {
    HttpError::new(StatusCode::NOT_FOUND, "Book not found in cart")
        .with_error("book", "The book is not in your cart.")
}

fn exceeds_stock(book_title: &str, available: i32) -> HttpError {
    HttpError::bad_request(format!(
        "Please, make an order of the {} less than or equal to {}.",
        book_title, available
    ))
    .with_error("quantity", format!("Only {} in stock.", available))
}

fn check_stock(book: &Book, quantity: i32) -> HttpResult<()> {
    if !book.in_stock() {
        return Err(HttpError::bad_request(format!("{} is not available", book.title))
            .with_error("quantity", "Out of stock."));
    }
    if quantity > book.quantity {
        return Err(exceeds_stock(&book.title, book.quantity));
    }
    Ok(())
}

pub async fn load(conn: &mut PgConnection, user_id: i64) -> HttpResult<CartResource> {
    let cart = carts::find_by_user(&mut *conn, user_id)
        .await?
        .ok_or_else(cart_not_found)?;
    let lines = carts::lines(&mut *conn, cart.id).await?;
    Ok(CartResource::new(cart, lines))
}

/// Put `quantity` copies of a book in the user's cart, creating the cart on first use
pub async fn add_book(
    conn: &mut PgConnection,
    user_id: i64,
    book_id: i64,
    quantity: i32,
) -> HttpResult<CartResource> {
    if quantity < 1 {
        return Err(HttpError::bad_request("Quantity must be at least 1")
            .with_error("quantity", "The quantity must be at least 1."));
    }

    let book = books::find(&mut *conn, book_id)
        .await?
        .ok_or_else(|| HttpError::not_found("book"))?;
    let cart = carts::get_or_create(&mut *conn, user_id).await?;

    if carts::find_line(&mut *conn, cart.id, book.id).await?.is_some() {
        return Err(HttpError::conflict(format!("Book {} already exists in the cart", book.title))
            .with_error("book", "The book is already in your cart."));
    }
    check_stock(&book, quantity)?;

    carts::add_line(
        &mut *conn,
        cart.id,
        book.id,
        quantity,
        book.discount,
        book.final_price(),
    )
    .await?;
    carts::recalculate_total(&mut *conn, cart.id).await?;

    tracing::debug!(user_id, book_id, quantity, "Book added to cart");
    load(conn, user_id).await
}

/// Step a line up or down by one; a line that reaches zero is removed
pub async fn change_quantity(
    conn: &mut PgConnection,
    user_id: i64,
    book_id: i64,
    operation: QuantityOperation,
) -> HttpResult<CartResource> {
    let cart = carts::find_by_user(&mut *conn, user_id)
        .await?
        .ok_or_else(cart_not_found)?;
    let line = carts::find_line(&mut *conn, cart.id, book_id)
        .await?
        .ok_or_else(not_in_cart)?;

    let quantity = line.quantity + operation.delta();
    if operation == QuantityOperation::Add && quantity > line.stock {
        return Err(exceeds_stock(&line.title, line.stock));
    }

    if quantity <= 0 {
        carts::remove_line(&mut *conn, cart.id, book_id).await?;
    } else {
        carts::set_line_quantity(&mut *conn, line.id, quantity).await?;
    }
    carts::recalculate_total(&mut *conn, cart.id).await?;

    load(conn, user_id).await
}

pub async fn remove_book(conn: &mut PgConnection, user_id: i64, book_id: i64) -> HttpResult<CartResource> {
    let cart = carts::find_by_user(&mut *conn, user_id)
        .await?
        .ok_or_else(cart_not_found)?;

    if !carts::remove_line(&mut *conn, cart.id, book_id).await? {
        return Err(not_in_cart());
    }
    carts::recalculate_total(&mut *conn, cart.id).await?;

    load(conn, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn book(quantity: i32) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: String::new(),
            category: "Fiction".to_string(),
            price: 10.0,
            publisher: "Chilton".to_string(),
            publication_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            language: "English".to_string(),
            reading_age: 14,
            pages: 412,
            dimension: None,
            quantity,
            discount: 0.0,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("add".parse::<QuantityOperation>().unwrap(), QuantityOperation::Add);
        assert_eq!("DELETE".parse::<QuantityOperation>().unwrap(), QuantityOperation::Delete);
        assert_eq!(
            "double".parse::<QuantityOperation>().unwrap_err().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_stock_checks() {
        assert!(check_stock(&book(3), 3).is_ok());

        let err = check_stock(&book(3), 4).unwrap_err();
        assert_eq!(err.message(), "Please, make an order of the Dune less than or equal to 3.");

        let err = check_stock(&book(0), 1).unwrap_err();
        assert_eq!(err.message(), "Dune is not available");
    }
}
