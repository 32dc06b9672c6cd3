//! Admin book search: free-text term, typed `filter_<field>[_<op>]`
//! parameters, a single sort key and 0-based pagination.

use crate::error::{ModelError, ModelResult};
use crate::models::Book;
use crate::repositories::books::BOOK_COLUMNS;
use crate::repositories::contains_pattern;
use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

const FILTER_PREFIX: &str = "filter_";
const TERM_COLUMNS: [&str; 6] = [
    "title",
    "author",
    "description",
    "category",
    "publisher",
    "language",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Int,
    Float,
    Date,
    Text,
}

/// Searchable columns and the type their filter values are parsed into
const FIELDS: [(&str, FieldKind); 14] = [
    ("id", FieldKind::Int),
    ("title", FieldKind::Text),
    ("author", FieldKind::Text),
    ("description", FieldKind::Text),
    ("category", FieldKind::Text),
    ("price", FieldKind::Float),
    ("publisher", FieldKind::Text),
    ("publication_date", FieldKind::Date),
    ("language", FieldKind::Text),
    ("reading_age", FieldKind::Int),
    ("pages", FieldKind::Int),
    ("dimension", FieldKind::Text),
    ("quantity", FieldKind::Int),
    ("discount", FieldKind::Float),
];

fn lookup_field(name: &str) -> Option<(&'static str, FieldKind)> {
    let snake = to_snake_case(name);
    FIELDS.iter().copied().find(|(column, _)| *column == snake)
}

/// `publicationDate` -> `publication_date`
fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.push(ch.to_ascii_lowercase());
        } else {
            snake.push(ch);
        }
    }
    snake
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gte,
    Lte,
    Gt,
    Lt,
    Like,
}

impl FilterOp {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "eq" => Some(FilterOp::Eq),
            "neq" => Some(FilterOp::Neq),
            "gte" => Some(FilterOp::Gte),
            "lte" => Some(FilterOp::Lte),
            "gt" => Some(FilterOp::Gt),
            "lt" => Some(FilterOp::Lt),
            "like" => Some(FilterOp::Like),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => " = ",
            FilterOp::Neq => " <> ",
            FilterOp::Gte => " >= ",
            FilterOp::Lte => " <= ",
            FilterOp::Gt => " > ",
            FilterOp::Lt => " < ",
            FilterOp::Like => " LIKE ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookFilter {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl BookFilter {
    /// Parse `filter_<field>[_<op>]=<value>`; `key` is given without the prefix
    fn parse(key: &str, raw_value: &str) -> ModelResult<Self> {
        let (field_raw, op_raw) = match key.split_once('_') {
            Some((field, op)) => (field, op),
            None => (key, "eq"),
        };

        let (column, kind) = lookup_field(field_raw)
            .ok_or_else(|| ModelError::query(format!("Unsupported field: {}", field_raw)))?;
        let op = FilterOp::parse(op_raw)
            .ok_or_else(|| ModelError::query(format!("Unsupported operator: {}", op_raw)))?;

        if op == FilterOp::Like && kind != FieldKind::Text {
            return Err(ModelError::query(format!(
                "Operator like only applies to string: {}",
                field_raw
            )));
        }

        let invalid = || ModelError::query(format!("Invalid value for {}: {}", field_raw, raw_value));
        let trimmed = raw_value.trim();
        let value = match kind {
            FieldKind::Int => FilterValue::Int(trimmed.parse().map_err(|_| invalid())?),
            FieldKind::Float => FilterValue::Float(trimmed.parse().map_err(|_| invalid())?),
            FieldKind::Date => FilterValue::Date(
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?,
            ),
            FieldKind::Text if op == FilterOp::Like => FilterValue::Text(contains_pattern(raw_value)),
            FieldKind::Text => FilterValue::Text(raw_value.to_string()),
        };

        Ok(Self { column, op, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookSort {
    pub column: &'static str,
    pub descending: bool,
}

impl BookSort {
    /// `field,dir`; any direction other than `desc` sorts ascending
    fn parse(raw: &str) -> ModelResult<Self> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [field, dir] = parts.as_slice() else {
            return Err(ModelError::query("Invalid sort parameter"));
        };
        let (column, _) = lookup_field(field)
            .ok_or_else(|| ModelError::query(format!("Cannot sort by field: {}", field)))?;

        Ok(Self {
            column,
            descending: dir.eq_ignore_ascii_case("desc"),
        })
    }
}

/// A parsed search request
#[derive(Debug, Clone, PartialEq)]
pub struct BookSearch {
    pub term: Option<String>,
    pub filters: Vec<BookFilter>,
    pub sort: Option<BookSort>,
    /// 0-based
    pub page: i64,
    pub size: i64,
}

impl Default for BookSearch {
    fn default() -> Self {
        Self {
            term: None,
            filters: Vec::new(),
            sort: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl BookSearch {
    /// Build a search from raw query-string pairs
    pub fn from_query<'a, I>(params: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut search = BookSearch::default();

        for (key, value) in params {
            match key {
                "searchTerm" => {
                    let term = value.trim();
                    if !term.is_empty() {
                        search.term = Some(term.to_lowercase());
                    }
                }
                "sort" if !value.trim().is_empty() => search.sort = Some(BookSort::parse(value)?),
                "page" => search.page = value.trim().parse::<i64>().unwrap_or(0).max(0),
                "size" => {
                    search.size = value
                        .trim()
                        .parse::<i64>()
                        .ok()
                        .filter(|size| *size > 0)
                        .map_or(DEFAULT_PAGE_SIZE, |size| size.min(MAX_PAGE_SIZE))
                }
                _ => {
                    if let Some(filter_key) = key.strip_prefix(FILTER_PREFIX) {
                        search.filters.push(BookFilter::parse(filter_key, value)?);
                    }
                }
            }
        }

        // OFFSET is bound as BIGINT, so the first row of the page must fit
        if search.page.checked_mul(search.size).is_none() {
            return Err(ModelError::query(format!("Page out of range: {}", search.page)));
        }

        Ok(search)
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    fn push_conditions<'a>(&'a self, builder: &mut QueryBuilder<'a, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(term) = &self.term {
            let pattern = contains_pattern(term);
            builder.push(" AND (");
            for (i, column) in TERM_COLUMNS.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push("LOWER(")
                    .push(*column)
                    .push(") LIKE ")
                    .push_bind(pattern.clone());
            }
            builder.push(")");
        }

        for filter in &self.filters {
            builder.push(" AND ").push(filter.column).push(filter.op.sql());
            match &filter.value {
                FilterValue::Int(v) => builder.push_bind(*v),
                FilterValue::Float(v) => builder.push_bind(*v),
                FilterValue::Date(v) => builder.push_bind(*v),
                FilterValue::Text(v) => builder.push_bind(v.as_str()),
            };
        }
    }
}

/// One page of results plus the totals needed for pagination metadata
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    /// 0-based
    pub page: i64,
    pub size: i64,
}

impl<T> Page<T> {
    pub fn current_page(&self) -> i64 {
        self.page + 1
    }

    pub fn last_page(&self) -> i64 {
        let size = self.size.max(1);
        let full = self.total / size;
        let partial = i64::from(self.total % size != 0);
        (full + partial).max(1)
    }

    fn first_index(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    /// 1-based position of the first item, `None` for an empty page
    pub fn from(&self) -> Option<i64> {
        (!self.items.is_empty()).then(|| self.first_index().saturating_add(1))
    }

    pub fn to(&self) -> Option<i64> {
        (!self.items.is_empty()).then(|| self.first_index().saturating_add(self.items.len() as i64))
    }
}

pub async fn search(conn: &mut PgConnection, search: &BookSearch) -> ModelResult<Page<Book>> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
    search.push_conditions(&mut count);
    let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
    search.push_conditions(&mut select);
    match &search.sort {
        Some(sort) => {
            select
                .push(" ORDER BY ")
                .push(sort.column)
                .push(if sort.descending { " DESC" } else { " ASC" })
                .push(", id ASC");
        }
        None => {
            select.push(" ORDER BY id ASC");
        }
    }
    select
        .push(" LIMIT ")
        .push_bind(search.size)
        .push(" OFFSET ")
        .push_bind(search.offset());

    let items = select.build_query_as::<Book>().fetch_all(&mut *conn).await?;

    Ok(Page {
        items,
        total,
        page: search.page,
        size: search.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> ModelResult<BookSearch> {
        BookSearch::from_query(pairs.iter().copied())
    }

    #[test]
    fn test_defaults() {
        let search = parse(&[]).unwrap();
        assert_eq!(search.page, 0);
        assert_eq!(search.size, DEFAULT_PAGE_SIZE);
        assert!(search.term.is_none());
    }

    #[test]
    fn test_camel_case_filter_with_operator() {
        let search = parse(&[("filter_readingAge_gte", "12"), ("filter_price_lt", "20.5")]).unwrap();
        assert_eq!(
            search.filters,
            vec![
                BookFilter {
                    column: "reading_age",
                    op: FilterOp::Gte,
                    value: FilterValue::Int(12)
                },
                BookFilter {
                    column: "price",
                    op: FilterOp::Lt,
                    value: FilterValue::Float(20.5)
                },
            ]
        );
    }

    #[test]
    fn test_filter_without_operator_means_eq() {
        let search = parse(&[("filter_category", "Fiction")]).unwrap();
        assert_eq!(search.filters[0].op, FilterOp::Eq);
        assert_eq!(search.filters[0].value, FilterValue::Text("Fiction".to_string()));
    }

    #[test]
    fn test_like_wraps_and_escapes() {
        let search = parse(&[("filter_title_like", "50%")]).unwrap();
        assert_eq!(search.filters[0].value, FilterValue::Text("%50\\%%".to_string()));
    }

    fn message(pairs: &[(&str, &str)]) -> String {
        parse(pairs).unwrap_err().to_string()
    }

    #[test]
    fn test_rejections() {
        assert!(message(&[("filter_isbn", "1")]).contains("Unsupported field: isbn"));
        assert!(message(&[("filter_price_between", "1")]).contains("Unsupported operator: between"));
        assert!(message(&[("filter_price_like", "1")]).contains("Operator like only applies to string"));
        assert!(message(&[("filter_pages", "many")]).contains("Invalid value for pages: many"));
        assert!(message(&[("sort", "price")]).contains("Invalid sort parameter"));
        assert!(message(&[("sort", "isbn,asc")]).contains("Cannot sort by field: isbn"));
    }

    #[test]
    fn test_sort_direction() {
        let search = parse(&[("sort", "publicationDate, DESC")]).unwrap();
        assert_eq!(
            search.sort,
            Some(BookSort {
                column: "publication_date",
                descending: true
            })
        );
        let search = parse(&[("sort", "title,sideways")]).unwrap();
        assert!(!search.sort.unwrap().descending);
    }

    #[test]
    fn test_bad_pagination_falls_back() {
        let search = parse(&[("page", "-3"), ("size", "0")]).unwrap();
        assert_eq!(search.page, 0);
        assert_eq!(search.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_size_is_capped() {
        let search = parse(&[("size", "9223372036854775807")]).unwrap();
        assert_eq!(search.size, MAX_PAGE_SIZE);
        assert_eq!(search.offset(), 0);
    }

    #[test]
    fn test_huge_page_is_rejected() {
        assert!(message(&[("page", "9223372036854775807")]).contains("Page out of range"));

        let last_fitting = (i64::MAX / DEFAULT_PAGE_SIZE).to_string();
        let search = parse(&[("page", last_fitting.as_str())]).unwrap();
        assert!(search.offset() > 0);
    }

    #[test]
    fn test_page_metadata_at_extremes() {
        let page = Page {
            items: vec![1],
            total: 5,
            page: i64::MAX,
            size: i64::MAX,
        };
        assert_eq!(page.last_page(), 1);
        assert_eq!(page.from(), Some(i64::MAX));
        assert_eq!(page.to(), Some(i64::MAX));

        let page: Page<i32> = Page {
            items: vec![],
            total: i64::MAX,
            page: 0,
            size: 1,
        };
        assert_eq!(page.last_page(), i64::MAX);
    }

    #[test]
    fn test_page_metadata() {
        let page = Page {
            items: vec![1, 2],
            total: 14,
            page: 1,
            size: 12,
        };
        assert_eq!(page.current_page(), 2);
        assert_eq!(page.last_page(), 2);
        assert_eq!(page.from(), Some(13));
        assert_eq!(page.to(), Some(14));

        let empty: Page<i32> = Page {
            items: vec![],
            total: 0,
            page: 0,
            size: 12,
        };
        assert_eq!(empty.last_page(), 1);
        assert_eq!(empty.from(), None);
    }
}
