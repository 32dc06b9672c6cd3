use crate::error::ModelResult;
use crate::repositories::users::{self, UserGroup};
use crate::repositories::books;
use serde::Serialize;
use sqlx::PgConnection;

/// Counters shown on the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users_count: i64,
    pub customers_count: i64,
    pub employees_count: i64,
    pub books_count: i64,
    pub orders_count: i64,
    pub revenue_all: f64,
    /// Orders with payment status PAID or SUCCESS
    pub revenue_paid: f64,
}

pub async fn dashboard(conn: &mut PgConnection) -> ModelResult<DashboardStats> {
    let users_count = users::count(&mut *conn, UserGroup::All).await?;
    let customers_count = users::count(&mut *conn, UserGroup::Customers).await?;
    let employees_count = users::count(&mut *conn, UserGroup::Employees).await?;
    let books_count = books::count(&mut *conn).await?;

    let (orders_count, revenue_all, revenue_paid) = sqlx::query_as::<_, (i64, f64, f64)>(
        "SELECT
            COUNT(*),
            COALESCE(SUM(total_amount), 0),
            COALESCE(SUM(total_amount) FILTER (WHERE UPPER(payment_status) IN ('PAID', 'SUCCESS')), 0)
         FROM orders",
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(DashboardStats {
        users_count,
        customers_count,
        employees_count,
        books_count,
        orders_count,
        revenue_all,
        revenue_paid,
    })
}
