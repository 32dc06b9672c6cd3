use crate::error::ModelResult;
use crate::models::{NewPayment, Payment};
use sqlx::PgExecutor;
use std::collections::HashMap;

const PAYMENT_COLUMNS: &str = "id, payment_method, pg_payment_id, pg_status, pg_response_message, \
     pg_name, pg_amount, created_at, updated_at";

pub async fn insert<'e, E>(db: E, payment: &NewPayment) -> ModelResult<Payment>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO payments (payment_method, pg_payment_id, pg_status, pg_response_message, pg_name)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        PAYMENT_COLUMNS
    );
    Ok(sqlx::query_as::<_, Payment>(&sql)
        .bind(&payment.payment_method)
        .bind(payment.pg_payment_id.as_deref())
        .bind(payment.pg_status.as_deref())
        .bind(payment.pg_response_message.as_deref())
        .bind(payment.pg_name.as_deref())
        .fetch_one(db)
        .await?)
}

pub async fn find<'e, E>(db: E, id: i64) -> ModelResult<Option<Payment>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
    Ok(sqlx::query_as::<_, Payment>(&sql).bind(id).fetch_optional(db).await?)
}

/// Payments keyed by id
pub async fn find_many<'e, E>(db: E, ids: &[i64]) -> ModelResult<HashMap<i64, Payment>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM payments WHERE id = ANY($1)", PAYMENT_COLUMNS);
    let rows = sqlx::query_as::<_, Payment>(&sql).bind(ids).fetch_all(db).await?;
    Ok(rows.into_iter().map(|payment| (payment.id, payment)).collect())
}

/// Record the VND amount sent to the gateway
pub async fn set_amount<'e, E>(db: E, id: i64, pg_amount: i64) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE payments SET pg_amount = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(pg_amount)
        .execute(db)
        .await?;
    Ok(())
}

/// Record the gateway outcome; a `None` transaction id keeps the stored one
pub async fn record_gateway_result<'e, E>(
    db: E,
    id: i64,
    pg_status: &str,
    message: &str,
    pg_payment_id: Option<&str>,
) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE payments SET
            pg_status = $2,
            pg_response_message = $3,
            pg_payment_id = COALESCE($4, pg_payment_id),
            updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(pg_status)
    .bind(message)
    .bind(pg_payment_id)
    .execute(db)
    .await?;
    Ok(())
}
