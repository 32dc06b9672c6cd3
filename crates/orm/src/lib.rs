//! # bookstore-orm
//!
//! Postgres persistence for the bookstore: connection pool, embedded
//! migrations, row models and per-table query functions.

pub mod database;
pub mod error;
pub mod models;
pub mod repositories;

pub use database::{connect, connect_lazy, health_check, migrate, HealthReport, MIGRATOR};
pub use error::{ModelError, ModelResult};
pub use repositories::book_search::{BookSearch, Page};
pub use repositories::stats::DashboardStats;
pub use repositories::users::UserGroup;

pub use sqlx::{PgConnection, PgPool, Postgres, Transaction};
