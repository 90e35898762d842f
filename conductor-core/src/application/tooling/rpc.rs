//! JSON-RPC bookkeeping shared by the stdio and event-stream transports.
//!
//! A transport owns the wire; [`RpcState`] owns request ids, the pending
//! response table and the handling of server-initiated traffic.

use super::error::ToolInvokeError;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, warn};

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

/// Outbound half of a transport: writes one JSON-RPC frame.
#[async_trait]
pub(crate) trait FrameSink: Send + Sync {
    async fn send_frame(&self, frame: &Value) -> Result<(), ToolInvokeError>;
}

pub(crate) struct RpcState {
    server: String,
    pending: AsyncMutex<HashMap<String, Responder>>,
    id_counter: AtomicU64,
    closed: AtomicBool,
}

impl RpcState {
    pub(crate) fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            pending: AsyncMutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn server(&self) -> &str {
        &self.server
    }

    pub(crate) async fn request(
        &self,
        sink: &dyn FrameSink,
        method: &str,
        params: Value,
    ) -> Result<Value, ToolInvokeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.terminated());
        }

        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        debug!(server = %self.server, method, id = %id, "Sending MCP request");
        if let Err(err) = sink.send_frame(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(Ok(value)) => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.clone(),
            }),
        }
    }

    pub(crate) async fn notify(
        &self,
        sink: &dyn FrameSink,
        method: &str,
        params: Value,
    ) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        sink.send_frame(&payload).await
    }

    /// Route one inbound frame: resolve a pending request, answer a server
    /// request, or log a notification.
    pub(crate) async fn route(&self, value: Value, sink: &dyn FrameSink) {
        match (value.get("id").cloned(), value.get("method").and_then(Value::as_str)) {
            (Some(id), Some(method)) => {
                let reply = self.answer_server_request(id, method);
                if let Err(err) = sink.send_frame(&reply).await {
                    warn!(server = %self.server, %err, "Failed to answer server request");
                }
            }
            (Some(id), None) => self.resolve(id, value).await,
            (None, Some(method)) => {
                debug!(server = %self.server, method, "Received notification from server");
            }
            (None, None) => {
                debug!(server = %self.server, "Ignoring frame without id or method");
            }
        }
    }

    /// Fail every in-flight request and refuse new ones.
    pub(crate) async fn fail_all(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut pending = self.pending.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(self.terminated()));
        }
    }

    async fn resolve(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };
        let Some(sender) = self.pending.lock().await.remove(&key) else {
            debug!(
                server = %self.server,
                response_id = key,
                "Received response for unknown request"
            );
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => Err(ToolInvokeError::Rpc {
                server: self.server.clone(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }),
            None => Ok(value),
        };
        let _ = sender.send(outcome);
    }

    fn answer_server_request(&self, id: Value, method: &str) -> Value {
        if method == "ping" {
            return json!({ "jsonrpc": "2.0", "id": id, "result": {} });
        }
        warn!(server = %self.server, method, "Server sent unsupported request");
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": -32601,
                "message": format!("client does not implement method '{method}'"),
            }
        })
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn terminated(&self) -> ToolInvokeError {
        ToolInvokeError::Terminated {
            server: self.server.clone(),
        }
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<Value>>,
    }

    impl RecordingSink {
        fn frames(&self) -> Vec<Value> {
            self.frames.lock().expect("frames lock").clone()
        }
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send_frame(&self, frame: &Value) -> Result<(), ToolInvokeError> {
            self.frames.lock().expect("frames lock").push(frame.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn request_resolves_with_result_payload() {
        let state = Arc::new(RpcState::new("demo"));
        let sink = Arc::new(RecordingSink::default());

        let request = {
            let state = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                state
                    .request(sink.as_ref(), "tools/list", json!({}))
                    .await
            })
        };

        while sink.frames().is_empty() {
            tokio::task::yield_now().await;
        }
        let sent = sink.frames().remove(0);
        assert_eq!(sent["method"], "tools/list");
        let id = sent["id"].clone();

        state
            .route(
                json!({"jsonrpc": "2.0", "id": id, "result": {"tools": []}}),
                sink.as_ref(),
            )
            .await;

        let result = request.await.expect("join").expect("request succeeds");
        assert_eq!(result, json!({"tools": []}));
    }

    #[tokio::test]
    async fn error_responses_become_rpc_errors() {
        let state = Arc::new(RpcState::new("demo"));
        let sink = Arc::new(RecordingSink::default());

        let request = {
            let state = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { state.request(sink.as_ref(), "tools/call", json!({})).await })
        };
        while sink.frames().is_empty() {
            tokio::task::yield_now().await;
        }
        let id = sink.frames()[0]["id"].clone();
        state
            .route(
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32602, "message": "bad params"}}),
                sink.as_ref(),
            )
            .await;

        let err = request.await.expect("join").expect_err("rpc error");
        assert!(matches!(err, ToolInvokeError::Rpc { code: -32602, .. }));
    }

    #[tokio::test]
    async fn ping_is_answered_and_unknown_requests_are_refused() {
        let state = RpcState::new("demo");
        let sink = RecordingSink::default();

        state
            .route(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"}), &sink)
            .await;
        state
            .route(
                json!({"jsonrpc": "2.0", "id": 8, "method": "sampling/createMessage"}),
                &sink,
            )
            .await;

        let frames = sink.frames();
        assert_eq!(frames[0], json!({"jsonrpc": "2.0", "id": 7, "result": {}}));
        assert_eq!(frames[1]["id"], 8);
        assert_eq!(frames[1]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn fail_all_terminates_pending_and_future_requests() {
        let state = Arc::new(RpcState::new("demo"));
        let sink = Arc::new(RecordingSink::default());

        let request = {
            let state = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { state.request(sink.as_ref(), "tools/list", json!({})).await })
        };
        while sink.frames().is_empty() {
            tokio::task::yield_now().await;
        }
        state.fail_all().await;

        let err = request.await.expect("join").expect_err("terminated");
        assert!(matches!(err, ToolInvokeError::Terminated { .. }));

        let again = state.request(sink.as_ref(), "tools/list", json!({})).await;
        assert!(matches!(again, Err(ToolInvokeError::Terminated { .. })));
    }
}
