use crate::error::{ModelError, ModelResult};
use crate::models::{Cart, CartLine};
use sqlx::{PgConnection, PgExecutor};

const LINE_SELECT: &str = "SELECT ci.id, ci.cart_id, ci.book_id, ci.quantity, ci.discount, ci.book_price,
        b.title, b.author, b.image_url, b.quantity AS stock
     FROM cart_items ci
     JOIN books b ON b.id = ci.book_id";

pub async fn find_by_user<'e, E>(db: E, user_id: i64) -> ModelResult<Option<Cart>>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_as::<_, Cart>(
        "SELECT id, user_id, total_price, created_at, updated_at FROM carts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?)
}

/// The user's cart, created empty on first use
pub async fn get_or_create(conn: &mut PgConnection, user_id: i64) -> ModelResult<Cart> {
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    find_by_user(&mut *conn, user_id)
        .await?
        .ok_or_else(|| ModelError::not_found("carts"))
}

/// Cart lines joined with their books, in insertion order
pub async fn lines<'e, E>(db: E, cart_id: i64) -> ModelResult<Vec<CartLine>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE ci.cart_id = $1 ORDER BY ci.id", LINE_SELECT);
    Ok(sqlx::query_as::<_, CartLine>(&sql).bind(cart_id).fetch_all(db).await?)
}

/// The line for `book_id`, if the book is in the cart
pub async fn find_line<'e, E>(db: E, cart_id: i64, book_id: i64) -> ModelResult<Option<CartLine>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{} WHERE ci.cart_id = $1 AND ci.book_id = $2", LINE_SELECT);
    Ok(sqlx::query_as::<_, CartLine>(&sql)
        .bind(cart_id)
        .bind(book_id)
        .fetch_optional(db)
        .await?)
}

/// Insert a line; `book_price` is the discounted unit price at the time of adding
pub async fn add_line<'e, E>(
    db: E,
    cart_id: i64,
    book_id: i64,
    quantity: i32,
    discount: f64,
    book_price: f64,
) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO cart_items (cart_id, book_id, quantity, discount, book_price)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(cart_id)
    .bind(book_id)
    .bind(quantity)
    .bind(discount)
    .bind(book_price)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn set_line_quantity<'e, E>(db: E, line_id: i64, quantity: i32) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
        .bind(line_id)
        .bind(quantity)
        .execute(db)
        .await?;
    Ok(())
}

/// Delete the line for `book_id`; false when there was none
pub async fn remove_line<'e, E>(db: E, cart_id: i64, book_id: i64) -> ModelResult<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND book_id = $2")
        .bind(cart_id)
        .bind(book_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Store `SUM(book_price * quantity)` as the cart total and return it
pub async fn recalculate_total<'e, E>(db: E, cart_id: i64) -> ModelResult<f64>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar::<_, f64>(
        "UPDATE carts SET
            total_price = COALESCE(
                (SELECT SUM(book_price * quantity) FROM cart_items WHERE cart_id = $1),
                0
            ),
            updated_at = NOW()
         WHERE id = $1
         RETURNING total_price",
    )
    .bind(cart_id)
    .fetch_one(db)
    .await?)
}

/// Remove every line and zero the total
pub async fn clear(conn: &mut PgConnection, cart_id: i64) -> ModelResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE carts SET total_price = 0, updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Sum of line quantities in the user's cart, 0 without a cart
pub async fn total_items<'e, E>(db: E, user_id: i64) -> ModelResult<i64>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(ci.quantity), 0)::bigint
         FROM cart_items ci
         JOIN carts c ON c.id = ci.cart_id
         WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?)
}
