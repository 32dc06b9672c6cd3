use crate::error::ModelResult;
use crate::models::{Address, AddressChanges, AddressInput};
use sqlx::PgExecutor;

const ADDRESS_COLUMNS: &str =
    "id, user_id, street, building_name, city, state, country, pincode, created_at, updated_at";

/// The user's addresses, oldest first
pub async fn list_for_user<'e, E>(db: E, user_id: i64) -> ModelResult<Vec<Address>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM addresses WHERE user_id = $1 ORDER BY id", ADDRESS_COLUMNS);
    Ok(sqlx::query_as::<_, Address>(&sql).bind(user_id).fetch_all(db).await?)
}

/// The address only if it belongs to `user_id`
pub async fn find_for_user<'e, E>(db: E, id: i64, user_id: i64) -> ModelResult<Option<Address>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM addresses WHERE id = $1 AND user_id = $2",
        ADDRESS_COLUMNS
    );
    Ok(sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?)
}

/// Any user's address, for staff order views
pub async fn find<'e, E>(db: E, id: i64) -> ModelResult<Option<Address>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM addresses WHERE id = $1", ADDRESS_COLUMNS);
    Ok(sqlx::query_as::<_, Address>(&sql).bind(id).fetch_optional(db).await?)
}

pub async fn create<'e, E>(db: E, user_id: i64, input: &AddressInput) -> ModelResult<Address>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO addresses (user_id, street, building_name, city, state, country, pincode)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {}",
        ADDRESS_COLUMNS
    );
    Ok(sqlx::query_as::<_, Address>(&sql)
        .bind(user_id)
        .bind(&input.street)
        .bind(&input.building_name)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.country)
        .bind(&input.pincode)
        .fetch_one(db)
        .await?)
}

pub async fn update<'e, E>(
    db: E,
    id: i64,
    user_id: i64,
    changes: &AddressChanges,
) -> ModelResult<Option<Address>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "UPDATE addresses SET
            street = COALESCE($3, street),
            building_name = COALESCE($4, building_name),
            city = COALESCE($5, city),
            state = COALESCE($6, state),
            country = COALESCE($7, country),
            pincode = COALESCE($8, pincode),
            updated_at = NOW()
         WHERE id = $1 AND user_id = $2
         RETURNING {}",
        ADDRESS_COLUMNS
    );
    Ok(sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .bind(user_id)
        .bind(changes.street.as_deref())
        .bind(changes.building_name.as_deref())
        .bind(changes.city.as_deref())
        .bind(changes.state.as_deref())
        .bind(changes.country.as_deref())
        .bind(changes.pincode.as_deref())
        .fetch_optional(db)
        .await?)
}

/// Delete an address only when `user_id` owns it
pub async fn delete<'e, E>(db: E, id: i64, user_id: i64) -> ModelResult<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
