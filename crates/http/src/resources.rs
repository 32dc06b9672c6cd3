//! Response shapes. Field names are camelCase on the wire.

use bookstore_orm::models::{Address, Book, Cart, CartLine, Order, OrderLine, Payment, User};
use bookstore_orm::Page;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResource {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub final_price: f64,
    pub publisher: String,
    pub publication_date: NaiveDate,
    pub language: String,
    pub reading_age: i32,
    pub pages: i32,
    pub dimension: Option<String>,
    pub quantity: i32,
    pub discount: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookResource {
    fn from(book: Book) -> Self {
        Self {
            final_price: book.final_price(),
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            category: book.category,
            price: book.price,
            publisher: book.publisher,
            publication_date: book.publication_date,
            language: book.language,
            reading_age: book.reading_age,
            pages: book.pages,
            dimension: book.dimension,
            quantity: book.quantity,
            discount: book.discount,
            image_url: book.image_url,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Laravel-style paginator metadata
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn from_page<S>(page: Page<S>) -> Self
    where
        T: From<S>,
    {
        let meta = PageMeta {
            current_page: page.current_page(),
            last_page: page.last_page(),
            per_page: page.size,
            total: page.total,
            from: page.from(),
            to: page.to(),
        };
        Self {
            data: page.items.into_iter().map(T::from).collect(),
            meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResource {
    pub address_id: i64,
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

impl From<Address> for AddressResource {
    fn from(address: Address) -> Self {
        Self {
            address_id: address.id,
            street: address.street,
            building_name: address.building_name,
            city: address.city,
            state: address.state,
            country: address.country,
            pincode: address.pincode,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResource {
    pub cart_item_id: i64,
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub discount: f64,
    /// Discounted unit price captured when the book was added
    pub book_price: f64,
    pub line_total: f64,
    pub stock: i32,
}

impl From<CartLine> for CartItemResource {
    fn from(line: CartLine) -> Self {
        Self {
            line_total: bookstore_core::money::round2(line.line_total()),
            cart_item_id: line.id,
            book_id: line.book_id,
            title: line.title,
            author: line.author,
            image_url: line.image_url,
            quantity: line.quantity,
            discount: line.discount,
            book_price: line.book_price,
            stock: line.stock,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResource {
    pub cart_id: i64,
    pub total_price: f64,
    pub books: Vec<CartItemResource>,
}

impl CartResource {
    pub fn new(cart: Cart, lines: Vec<CartLine>) -> Self {
        Self {
            cart_id: cart.id,
            total_price: cart.total_price,
            books: lines.into_iter().map(CartItemResource::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResource {
    pub payment_id: i64,
    pub payment_method: String,
    pub pg_payment_id: Option<String>,
    pub pg_status: Option<String>,
    pub pg_response_message: Option<String>,
    pub pg_name: Option<String>,
    pub pg_amount: Option<i64>,
}

impl From<Payment> for PaymentResource {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.id,
            payment_method: payment.payment_method,
            pg_payment_id: payment.pg_payment_id,
            pg_status: payment.pg_status,
            pg_response_message: payment.pg_response_message,
            pg_name: payment.pg_name,
            pg_amount: payment.pg_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResource {
    pub order_item_id: i64,
    pub book_id: Option<i64>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub discount: f64,
    pub ordered_book_price: f64,
}

impl From<OrderLine> for OrderItemResource {
    fn from(line: OrderLine) -> Self {
        Self {
            order_item_id: line.id,
            book_id: line.book_id,
            title: line.title,
            image_url: line.image_url,
            quantity: line.quantity,
            discount: line.discount,
            ordered_book_price: line.ordered_book_price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResource {
    pub order_id: i64,
    pub order_code: Option<String>,
    pub email: String,
    pub order_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub total_amount: f64,
    pub total_amount_vnd: Option<i64>,
    pub order_status: String,
    pub payment_status: String,
    pub address_id: Option<i64>,
    pub payment: Option<PaymentResource>,
    pub order_items: Vec<OrderItemResource>,
}

impl OrderResource {
    pub fn new(order: Order, payment: Option<Payment>, lines: Vec<OrderLine>) -> Self {
        Self {
            order_id: order.id,
            order_code: order.order_code,
            email: order.email,
            order_date: order.order_date,
            created_at: order.created_at,
            paid_at: order.paid_at,
            total_amount: order.total_amount,
            total_amount_vnd: order.total_amount_vnd,
            order_status: order.order_status,
            payment_status: order.payment_status,
            address_id: order.address_id,
            payment: payment.map(PaymentResource::from),
            order_items: lines.into_iter().map(OrderItemResource::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResource {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl UserResource {
    pub fn new(user: User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            roles,
        }
    }
}

/// `GET /user/me`: the profile plus saved addresses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResource {
    #[serde(flatten)]
    pub user: UserResource,
    pub created_at: DateTime<Utc>,
    pub addresses: Vec<AddressResource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order() -> Order {
        Order {
            id: 9,
            order_code: Some("ORD20250101-00000009-AB12".to_string()),
            email: "ann@example.com".to_string(),
            order_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            payment_id: Some(4),
            address_id: Some(2),
            total_amount: 25.5,
            total_amount_vnd: None,
            order_status: "ACCEPTED".to_string(),
            payment_status: "PENDING".to_string(),
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_resource_field_names() {
        let line = OrderLine {
            id: 1,
            order_id: 9,
            book_id: Some(3),
            quantity: 2,
            discount: 10.0,
            ordered_book_price: 12.75,
            title: Some("Dune".to_string()),
            image_url: None,
        };
        let value = serde_json::to_value(OrderResource::new(order(), None, vec![line])).unwrap();

        assert_eq!(value["orderId"], json!(9));
        assert_eq!(value["orderCode"], json!("ORD20250101-00000009-AB12"));
        assert_eq!(value["orderStatus"], json!("ACCEPTED"));
        assert_eq!(value["payment"], json!(null));
        assert_eq!(value["orderItems"][0]["orderedBookPrice"], json!(12.75));
    }

    #[test]
    fn test_page_meta() {
        let page = Page {
            items: vec![1i64, 2],
            total: 14,
            page: 1,
            size: 12,
        };
        let paginated: Paginated<i64> = Paginated::from_page(page);
        assert_eq!(paginated.meta.current_page, 2);
        assert_eq!(paginated.meta.last_page, 2);
        assert_eq!(paginated.meta.from, Some(13));
        assert_eq!(paginated.meta.to, Some(14));
    }
}
