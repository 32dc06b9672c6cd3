//! `GET /api/health`

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bookstore_orm::health_check;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub status: &'static str,
    pub latency_ms: u128,
    pub pool_size: u32,
    pub idle_connections: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
    pub database: DatabaseStatus,
}

/// 200 while the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let report = health_check(&state.pool).await;
    let code = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthStatus {
        status: if report.healthy { "healthy" } else { "degraded" },
        service: state.config.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseStatus {
            status: report.status(),
            latency_ms: report.latency.as_millis(),
            pool_size: report.pool_size,
            idle_connections: report.idle_connections,
        },
    };

    (code, Json(body))
}
