use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;

/// Build the HTTP surface. An empty origin list allows any origin.
pub fn router(state: Arc<ServerState>, allowed_origins: &[String]) -> Router {
    let api = ApiDoc::openapi();

    let cors = CorsLayer::new()
        .allow_origin(allow_origin(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api-doc/openapi.json", get(move || async move { Json(api) }))
        .route("/chat", get(routes::chat::chat_socket))
        .route("/tools", get(routes::tools::tools_handler))
        .route("/tools/refresh", post(routes::tools::refresh_handler))
        .route("/health", get(routes::health::health_handler))
        .layer(cors)
        .with_state(state)
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.is_empty() {
        return AllowOrigin::any();
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(parsed)
}

pub(super) async fn serve(
    state: Arc<ServerState>,
    addr: SocketAddr,
    allowed_origins: &[String],
) -> Result<(), ServerError> {
    info!(%addr, "Binding HTTP server");
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "HTTP server ready to accept connections");

    axum::serve(listener, router(state, allowed_origins).into_make_service())
        .await
        .map_err(ServerError::Serve)
}
