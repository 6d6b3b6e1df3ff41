//! Health check endpoint for load balancers and uptime probes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use shopkeep_db::migrations::migration_status;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub server_time: String,
}

/// `GET /health`. 503 when the database does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (total, applied) = migration_status(state.db.pool()).await.unwrap_or((0, 0));

    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            migrations_applied: applied,
            migrations_total: total,
            server_time: Utc::now().to_rfc3339(),
        }),
    )
}
