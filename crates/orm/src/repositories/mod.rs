//! Query functions grouped by table.
//!
//! Single-statement functions are generic over [`sqlx::PgExecutor`] so they
//! run against the pool or inside a transaction (`&mut *tx`). Functions that
//! issue several statements take a `&mut PgConnection`.

pub mod addresses;
pub mod book_search;
pub mod books;
pub mod carts;
pub mod orders;
pub mod payments;
pub mod stats;
pub mod users;

/// Escape `\`, `%` and `_` so user input matches literally inside LIKE
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `%term%` with LIKE metacharacters escaped
pub fn contains_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}
