use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{instrument, warn};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub database: DatabaseStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// GET /api/health. An unreachable database is a 503 body, not an error.
#[instrument(skip(state))]
pub async fn health_route(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = OffsetDateTime::now_utc();
    match state.signups.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                success: true,
                message: "server is running",
                database: DatabaseStatus::Connected,
                timestamp,
            }),
        ),
        Err(e) => {
            warn!(error = ?e, "health check: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    success: false,
                    message: "server is running, but the database is unreachable",
                    database: DatabaseStatus::Disconnected,
                    timestamp,
                }),
            )
        }
    }
}
