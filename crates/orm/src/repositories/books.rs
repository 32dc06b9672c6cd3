use crate::error::{ModelError, ModelResult};
use crate::models::{Book, BookChanges, NewBook};
use crate::repositories::{carts, contains_pattern};
use sqlx::{PgConnection, PgExecutor};

pub(crate) const BOOK_COLUMNS: &str = "id, title, author, description, category, price, publisher, \
     publication_date, language, reading_age, pages, dimension, quantity, discount, image_url, \
     created_at, updated_at";

pub async fn all<'e, E>(db: E) -> ModelResult<Vec<Book>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);
    Ok(sqlx::query_as::<_, Book>(&sql).fetch_all(db).await?)
}

/// Look up a book by id
pub async fn find<'e, E>(db: E, id: i64) -> ModelResult<Option<Book>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
    Ok(sqlx::query_as::<_, Book>(&sql).bind(id).fetch_optional(db).await?)
}

/// Lock the book row until the surrounding transaction ends
pub async fn find_for_update<'e, E>(db: E, id: i64) -> ModelResult<Option<Book>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS);
    Ok(sqlx::query_as::<_, Book>(&sql).bind(id).fetch_optional(db).await?)
}

/// Case-insensitive title fragment match; every book when the term is blank
pub async fn search_title<'e, E>(db: E, term: Option<&str>) -> ModelResult<Vec<Book>>
where
    E: PgExecutor<'e>,
{
    let pattern = term
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| contains_pattern(&term.to_lowercase()));

    let sql = format!(
        "SELECT {} FROM books WHERE ($1::text IS NULL OR LOWER(title) LIKE $1) ORDER BY id",
        BOOK_COLUMNS
    );
    Ok(sqlx::query_as::<_, Book>(&sql).bind(pattern).fetch_all(db).await?)
}

/// True when a book other than `except_id` already uses the title
pub async fn title_taken<'e, E>(db: E, title: &str, except_id: Option<i64>) -> ModelResult<bool>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM books WHERE title = $1 AND ($2::bigint IS NULL OR id <> $2))",
    )
    .bind(title)
    .bind(except_id)
    .fetch_one(db)
    .await?)
}

pub async fn create<'e, E>(db: E, book: &NewBook) -> ModelResult<Book>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO books (title, author, description, category, price, publisher,
            publication_date, language, reading_age, pages, dimension, quantity, discount, image_url)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING {}",
        BOOK_COLUMNS
    );
    Ok(sqlx::query_as::<_, Book>(&sql)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.category)
        .bind(book.price)
        .bind(&book.publisher)
        .bind(book.publication_date)
        .bind(&book.language)
        .bind(book.reading_age)
        .bind(book.pages)
        .bind(book.dimension.as_deref())
        .bind(book.quantity)
        .bind(book.discount)
        .bind(book.image_url.as_deref())
        .fetch_one(db)
        .await?)
}

/// Apply the present fields of `changes`; `None` when the book does not exist
pub async fn update<'e, E>(db: E, id: i64, changes: &BookChanges) -> ModelResult<Option<Book>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "UPDATE books SET
            title = COALESCE($2, title),
            author = COALESCE($3, author),
            description = COALESCE($4, description),
            category = COALESCE($5, category),
            price = COALESCE($6, price),
            publisher = COALESCE($7, publisher),
            publication_date = COALESCE($8, publication_date),
            language = COALESCE($9, language),
            reading_age = COALESCE($10, reading_age),
            pages = COALESCE($11, pages),
            dimension = COALESCE($12, dimension),
            quantity = COALESCE($13, quantity),
            discount = COALESCE($14, discount),
            image_url = COALESCE($15, image_url),
            updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        BOOK_COLUMNS
    );
    Ok(sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.author.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.price)
        .bind(changes.publisher.as_deref())
        .bind(changes.publication_date)
        .bind(changes.language.as_deref())
        .bind(changes.reading_age)
        .bind(changes.pages)
        .bind(changes.dimension.as_deref())
        .bind(changes.quantity)
        .bind(changes.discount)
        .bind(changes.image_url.as_deref())
        .fetch_optional(db)
        .await?)
}

/// Delete a book together with the cart lines that reference it and refresh
/// the totals of the affected carts. Run inside a transaction.
pub async fn delete(conn: &mut PgConnection, id: i64) -> ModelResult<bool> {
    let affected_carts = sqlx::query_scalar::<_, i64>(
        "DELETE FROM cart_items WHERE book_id = $1 RETURNING cart_id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let result = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    for cart_id in affected_carts {
        carts::recalculate_total(&mut *conn, cart_id).await?;
    }

    Ok(result.rows_affected() > 0)
}

/// Take `quantity` copies out of stock; false when fewer are available
pub async fn decrement_stock<'e, E>(db: E, id: i64, quantity: i32) -> ModelResult<bool>
where
    E: PgExecutor<'e>,
{
    if quantity <= 0 {
        return Err(ModelError::query("Quantity must be positive"));
    }

    let result = sqlx::query(
        "UPDATE books SET quantity = quantity - $2, updated_at = NOW()
         WHERE id = $1 AND quantity >= $2",
    )
    .bind(id)
    .bind(quantity)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count<'e, E>(db: E) -> ModelResult<i64>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
        .fetch_one(db)
        .await?)
}
