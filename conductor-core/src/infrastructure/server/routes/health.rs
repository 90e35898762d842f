use super::super::dto::HealthResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use chrono::Utc;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service liveness and registry summary", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let registry = state.sessions().registry().current().await;
    let started_at = state.started_at();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at,
        uptime_secs: (Utc::now() - started_at).num_seconds(),
        tools: registry.len(),
        failed_servers: registry.failures().len(),
    })
}
