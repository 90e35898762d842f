use super::dto::{
    DiscoveryFailure, HealthResponse, ServerStatus, ShadowedEntry, ToolEntry,
    ToolInventoryResponse,
};
use super::routes;
use crate::config::{RegistryPolicy, TransportKind};
use crate::domain::ServerIdentity;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::tools::tools_handler,
        routes::tools::refresh_handler,
        routes::health::health_handler
    ),
    components(
        schemas(
            ToolInventoryResponse,
            ToolEntry,
            ServerStatus,
            DiscoveryFailure,
            ShadowedEntry,
            HealthResponse,
            ServerIdentity,
            TransportKind,
            RegistryPolicy
        )
    ),
    tags(
        (name = "tools", description = "Aggregated MCP tool registry"),
        (name = "health", description = "Service status")
    )
)]
pub(super) struct ApiDoc;
