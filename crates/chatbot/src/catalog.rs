//! Book lookups used by retrieval, behind a trait so the ranking logic can be
//! exercised without a database.

use crate::error::ChatbotResult;
use crate::filters::ChatFilters;
use async_trait::async_trait;
use bookstore_orm::repositories::contains_pattern;
use bookstore_orm::PgPool;
use sqlx::{FromRow, Postgres, QueryBuilder};

/// The columns retrieval needs from a book row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CatalogBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: f64,
    pub discount: f64,
    pub quantity: i32,
    pub description: String,
    pub reading_age: i32,
}

#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Books satisfying `filters`, in business order
    async fn filtered(&self, filters: &ChatFilters, limit: i64) -> ChatbotResult<Vec<CatalogBook>>;

    /// Books satisfying `filters` whose title, author, category or
    /// description contains `keyword`, ranked by where it matched, then by
    /// `purpose` appearing in the description, then in business order
    async fn keyword(
        &self,
        filters: &ChatFilters,
        keyword: &str,
        purpose: Option<&str>,
        limit: i64,
    ) -> ChatbotResult<Vec<CatalogBook>>;
}

const SELECT: &str =
    "SELECT id, title, author, category, price, discount, quantity, description, reading_age FROM books WHERE TRUE";

/// In stock first, biggest discount, cheapest
const BUSINESS_ORDER: &str = "CASE WHEN quantity > 0 THEN 0 ELSE 1 END, discount DESC, price ASC";

pub(crate) fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &ChatFilters) {
    if let Some(category) = filters.category.as_ref().filter(|c| !c.is_empty()) {
        query.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(language) = filters.language.as_ref().filter(|l| !l.is_empty()) {
        query.push(" AND language = ").push_bind(language.clone());
    }
    if let Some(min) = filters.min_price {
        query.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filters.max_price {
        query.push(" AND price <= ").push_bind(max);
    }
    if let Some(age) = filters.reading_age {
        query.push(" AND reading_age <= ").push_bind(age);
    }
}

pub(crate) fn filtered_query(filters: &ChatFilters, limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SELECT);
    push_filters(&mut query, filters);
    query.push(" ORDER BY ").push(BUSINESS_ORDER);
    query.push(" LIMIT ").push_bind(limit);
    query
}

pub(crate) fn keyword_query(
    filters: &ChatFilters,
    keyword: &str,
    purpose: Option<&str>,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let pattern = contains_pattern(keyword.trim());

    let mut query = QueryBuilder::new(SELECT);
    push_filters(&mut query, filters);

    query.push(" AND (");
    for (i, column) in ["title", "author", "category", "description"].iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query.push(*column).push(" ILIKE ").push_bind(pattern.clone());
    }
    query.push(")");

    query.push(" ORDER BY (");
    for (i, (column, weight)) in [("title", 4), ("author", 2), ("category", 1)].iter().enumerate() {
        if i > 0 {
            query.push(" + ");
        }
        query
            .push("(CASE WHEN ")
            .push(*column)
            .push(" ILIKE ")
            .push_bind(pattern.clone())
            .push(format!(" THEN {} ELSE 0 END)", weight));
    }
    query.push(") DESC");

    if let Some(purpose) = purpose {
        query
            .push(", (CASE WHEN description ILIKE ")
            .push_bind(contains_pattern(purpose))
            .push(" THEN 1 ELSE 0 END) DESC");
    }

    query.push(", ").push(BUSINESS_ORDER);
    query.push(" LIMIT ").push_bind(limit);
    query
}

/// [`BookCatalog`] over the `books` table
#[derive(Debug, Clone)]
pub struct PgBookCatalog {
    pool: PgPool,
}

impl PgBookCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookCatalog for PgBookCatalog {
    async fn filtered(&self, filters: &ChatFilters, limit: i64) -> ChatbotResult<Vec<CatalogBook>> {
        let mut query = filtered_query(filters, limit);
        let rows = query
            .build_query_as::<CatalogBook>()
            .fetch_all(&self.pool)
            .await
            .map_err(bookstore_orm::ModelError::from)?;
        Ok(rows)
    }

    async fn keyword(
        &self,
        filters: &ChatFilters,
        keyword: &str,
        purpose: Option<&str>,
        limit: i64,
    ) -> ChatbotResult<Vec<CatalogBook>> {
        let mut query = keyword_query(filters, keyword, purpose, limit);
        let rows = query
            .build_query_as::<CatalogBook>()
            .fetch_all(&self.pool)
            .await
            .map_err(bookstore_orm::ModelError::from)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_query_binds_every_filter() {
        let filters = ChatFilters {
            category: Some("Fantasy".to_string()),
            min_price: Some(5.0),
            max_price: Some(20.0),
            reading_age: Some(12),
            ..ChatFilters::default()
        };
        let query = filtered_query(&filters, 8);
        assert_eq!(
            query.sql(),
            "SELECT id, title, author, category, price, discount, quantity, description, reading_age \
             FROM books WHERE TRUE AND category = $1 AND price >= $2 AND price <= $3 \
             AND reading_age <= $4 ORDER BY CASE WHEN quantity > 0 THEN 0 ELSE 1 END, \
             discount DESC, price ASC LIMIT $5"
        );
    }

    #[test]
    fn test_age_range_is_not_part_of_the_query() {
        let filters = ChatFilters {
            min_reading_age: Some(10),
            max_reading_age: Some(14),
            ..ChatFilters::default()
        };
        assert_eq!(
            filtered_query(&filters, 8).sql(),
            filtered_query(&ChatFilters::default(), 8).sql()
        );
    }

    #[test]
    fn test_keyword_query_ranks_title_over_author_over_category() {
        let query = keyword_query(&ChatFilters::default(), "dragons", Some("novel"), 8);
        let sql = query.sql();
        assert!(sql.contains(
            "AND (title ILIKE $1 OR author ILIKE $2 OR category ILIKE $3 OR description ILIKE $4)"
        ));
        assert!(sql.contains(
            "ORDER BY ((CASE WHEN title ILIKE $5 THEN 4 ELSE 0 END) + \
             (CASE WHEN author ILIKE $6 THEN 2 ELSE 0 END) + \
             (CASE WHEN category ILIKE $7 THEN 1 ELSE 0 END)) DESC, \
             (CASE WHEN description ILIKE $8 THEN 1 ELSE 0 END) DESC, CASE WHEN quantity"
        ));
        assert!(sql.ends_with("LIMIT $9"));
    }

    #[test]
    fn test_keyword_query_without_purpose() {
        let query = keyword_query(&ChatFilters::default(), "dune", None, 3);
        assert!(!query.sql().contains("description ILIKE $8"));
        assert!(query.sql().ends_with("LIMIT $8"));
    }
}
