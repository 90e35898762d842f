use super::super::dto::ToolInventoryResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;
use tracing::{debug, info};

#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Tools in the current registry", body = ToolInventoryResponse)
    )
)]
pub async fn tools_handler(State(state): State<Arc<ServerState>>) -> Json<ToolInventoryResponse> {
    let source = state.sessions().registry();
    let registry = source.current().await;
    debug!(
        tool_count = registry.len(),
        server_count = registry.servers().len(),
        "Serving /tools request"
    );
    Json(ToolInventoryResponse::from_registry(&registry, source.policy()))
}

#[utoipa::path(
    post,
    path = "/tools/refresh",
    tag = "tools",
    responses(
        (status = 200, description = "Registry rebuilt from every configured server", body = ToolInventoryResponse)
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<ServerState>>,
) -> Json<ToolInventoryResponse> {
    let source = state.sessions().registry();
    let registry = source.refresh().await;
    info!(tool_count = registry.len(), "Registry refreshed via HTTP");
    Json(ToolInventoryResponse::from_registry(&registry, source.policy()))
}
