//! HTTP and WebSocket surface.

mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use dto::{HealthResponse, ToolInventoryResponse};
pub use error::ServerError;
pub use router::router;
pub use state::ServerState;

use std::net::SocketAddr;
use std::sync::Arc;

pub async fn serve(
    state: Arc<ServerState>,
    addr: SocketAddr,
    allowed_origins: &[String],
) -> Result<(), ServerError> {
    router::serve(state, addr, allowed_origins).await
}
