//! `GET /health` (spec.md's ambient liveness probe): checks the process is
//! up and that the store connection can still serve a trivial query.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.connection() {
        Ok(conn) => match conn.query("SELECT 1", ()).await {
            Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ok", store: "ok" })),
            Err(e) => {
                tracing::warn!(error = %e, "health probe query failed");
                (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "degraded", store: "unreachable" }))
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "health probe connection failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "degraded", store: "unreachable" }))
        }
    }
}
