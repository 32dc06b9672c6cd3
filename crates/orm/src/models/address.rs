use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A delivery address owned by one user
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressChanges {
    pub street: Option<String>,
    pub building_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
}
