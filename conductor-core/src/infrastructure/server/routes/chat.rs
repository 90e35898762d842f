use super::super::state::ServerState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Upgrade to a WebSocket; each socket gets its own session and task.
pub async fn chat_socket(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut session = state.sessions().open().await;
    let session_id = session.id();

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!(%session_id, %err, "WebSocket receive failed");
                break;
            }
        };

        let reply = session.handle(text.as_str()).await;
        if let Some(rendered) = reply.render() {
            if socket.send(Message::Text(rendered.into())).await.is_err() {
                debug!(%session_id, "Client went away before reply was sent");
                break;
            }
        }
        if reply.is_farewell() {
            let _ = socket.send(Message::Close(None)).await;
            break;
        }
    }

    let open_secs = (Utc::now() - session.opened_at()).num_seconds();
    info!(
        %session_id,
        open_secs,
        memory_entries = session.memory().len(),
        "Session closed"
    );
}
