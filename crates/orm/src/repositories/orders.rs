use crate::error::{ModelError, ModelResult};
use crate::models::{NewOrder, Order, OrderLine};
use crate::repositories::contains_pattern;
use bookstore_core::{order_code, OrderStatus, PaymentStatus};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor};
use std::collections::HashMap;

const ORDER_COLUMNS: &str = "id, order_code, email, order_date, payment_id, address_id, total_amount, \
     total_amount_vnd, order_status, payment_status, paid_at, created_at, updated_at";

const LINE_SELECT: &str = "SELECT oi.id, oi.order_id, oi.book_id, oi.quantity, oi.discount,
        oi.ordered_book_price, b.title, b.image_url
     FROM order_items oi
     LEFT JOIN books b ON b.id = oi.book_id";

const CODE_ATTEMPTS: usize = 10;

pub async fn insert<'e, E>(db: E, order: &NewOrder) -> ModelResult<Order>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO orders (email, order_date, payment_id, address_id, total_amount,
            order_status, payment_status)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {}",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql)
        .bind(&order.email)
        .bind(order.order_date)
        .bind(order.payment_id)
        .bind(order.address_id)
        .bind(order.total_amount)
        .bind(order.order_status.as_str())
        .bind(order.payment_status.as_str())
        .fetch_one(db)
        .await?)
}

/// Generate a code no other order uses and store it on the order
pub async fn assign_code(conn: &mut PgConnection, order_id: i64, date: NaiveDate) -> ModelResult<String> {
    for _ in 0..CODE_ATTEMPTS {
        let code = order_code::generate(date, order_id);
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE order_code = $1)",
        )
        .bind(&code)
        .fetch_one(&mut *conn)
        .await?;

        if !taken {
            sqlx::query("UPDATE orders SET order_code = $2, updated_at = NOW() WHERE id = $1")
                .bind(order_id)
                .bind(&code)
                .execute(&mut *conn)
                .await?;
            return Ok(code);
        }
    }

    Err(ModelError::query(format!(
        "Could not generate a unique code for order {}",
        order_id
    )))
}

pub async fn add_item<'e, E>(
    db: E,
    order_id: i64,
    book_id: i64,
    quantity: i32,
    discount: f64,
    ordered_book_price: f64,
) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO order_items (order_id, book_id, quantity, discount, ordered_book_price)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order_id)
    .bind(book_id)
    .bind(quantity)
    .bind(discount)
    .bind(ordered_book_price)
    .execute(db)
    .await?;
    Ok(())
}

/// Order items with the book title and image, when the book still exists
pub async fn lines<'e, E>(db: E, order_id: i64) -> ModelResult<Vec<OrderLine>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE oi.order_id = $1 ORDER BY oi.id", LINE_SELECT);
    Ok(sqlx::query_as::<_, OrderLine>(&sql).bind(order_id).fetch_all(db).await?)
}

/// Lines for several orders, keyed by order id
pub async fn lines_for_orders<'e, E>(db: E, order_ids: &[i64]) -> ModelResult<HashMap<i64, Vec<OrderLine>>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, oi.id", LINE_SELECT);
    let rows = sqlx::query_as::<_, OrderLine>(&sql)
        .bind(order_ids)
        .fetch_all(db)
        .await?;

    let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for line in rows {
        grouped.entry(line.order_id).or_default().push(line);
    }
    Ok(grouped)
}

pub async fn find<'e, E>(db: E, id: i64) -> ModelResult<Option<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(db).await?)
}

/// Look up an order by its public code
pub async fn find_by_code<'e, E>(db: E, code: &str) -> ModelResult<Option<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM orders WHERE order_code = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(code).fetch_optional(db).await?)
}

/// Lock the order row until the surrounding transaction ends
pub async fn find_by_code_for_update<'e, E>(db: E, code: &str) -> ModelResult<Option<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM orders WHERE order_code = $1 FOR UPDATE",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql).bind(code).fetch_optional(db).await?)
}

/// Every order, newest first
pub async fn list<'e, E>(db: E) -> ModelResult<Vec<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM orders ORDER BY order_date DESC, id DESC",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql).fetch_all(db).await?)
}

/// Orders placed by one user, newest first
pub async fn list_by_email<'e, E>(db: E, email: &str) -> ModelResult<Vec<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM orders WHERE email = $1 ORDER BY order_date DESC, id DESC",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql).bind(email).fetch_all(db).await?)
}

/// Orders whose code contains `term`, case-insensitively
pub async fn search_by_code<'e, E>(db: E, term: &str) -> ModelResult<Vec<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM orders WHERE UPPER(order_code) LIKE $1 ORDER BY order_date DESC, id DESC",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql)
        .bind(contains_pattern(&term.trim().to_uppercase()))
        .fetch_all(db)
        .await?)
}

pub async fn set_order_status<'e, E>(db: E, id: i64, status: OrderStatus) -> ModelResult<Option<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "UPDATE orders SET order_status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(db)
        .await?)
}

/// Settled statuses stamp `paid_at` (keeping an earlier stamp); others clear it
pub async fn set_payment_status<'e, E>(
    db: E,
    id: i64,
    status: PaymentStatus,
) -> ModelResult<Option<Order>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "UPDATE orders SET
            payment_status = $2,
            paid_at = CASE WHEN $3 THEN COALESCE(paid_at, NOW()) ELSE NULL END,
            updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .bind(status.as_str())
        .bind(status.is_settled())
        .fetch_optional(db)
        .await?)
}

pub async fn set_amount_vnd<'e, E>(db: E, id: i64, amount_vnd: i64) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE orders SET total_amount_vnd = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(amount_vnd)
        .execute(db)
        .await?;
    Ok(())
}
