use super::auth::resolve_headers;
use super::error::ToolInvokeError;
use super::rpc::{FrameSink, RpcState};
use crate::config::EventStreamParams;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use reqwest_eventsource::{Event, EventSource, retry};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";

/// Event-stream transport: server frames arrive as SSE `message` events,
/// client frames are POSTed to the endpoint announced by the server.
pub(crate) struct EventStreamTransport {
    poster: Arc<EndpointPoster>,
    reader: JoinHandle<()>,
}

struct EndpointPoster {
    server: String,
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
}

impl EventStreamTransport {
    pub(crate) async fn open(
        client: &Client,
        params: &EventStreamParams,
        rpc: Arc<RpcState>,
    ) -> Result<Self, ToolInvokeError> {
        let server = rpc.server().to_string();
        let transport_error = |message: String| ToolInvokeError::Transport {
            server: server.clone(),
            message,
        };

        let base = Url::parse(&params.url)
            .map_err(|err| transport_error(format!("invalid event-stream url: {err}")))?;
        let headers = resolve_headers(client, &server, params).await?;

        let request = client
            .get(base.clone())
            .headers(headers.clone())
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let mut source = EventSource::new(request)
            .map_err(|err| transport_error(format!("cannot open event stream: {err}")))?;
        source.set_retry_policy(Box::new(retry::Never));

        let endpoint = loop {
            match source.next().await {
                Some(Ok(Event::Open)) => {
                    debug!(server = %server, url = %base, "Event stream opened");
                }
                Some(Ok(Event::Message(message))) if message.event == ENDPOINT_EVENT => {
                    break base.join(message.data.trim()).map_err(|err| {
                        transport_error(format!("invalid endpoint '{}': {err}", message.data))
                    })?;
                }
                Some(Ok(Event::Message(message))) => {
                    debug!(
                        server = %server,
                        event = %message.event,
                        "Ignoring event received before endpoint"
                    );
                }
                Some(Err(err)) => {
                    source.close();
                    return Err(classify(&server, err));
                }
                None => {
                    return Err(ToolInvokeError::Terminated {
                        server: server.clone(),
                    });
                }
            }
        };
        debug!(server = %server, endpoint = %endpoint, "Event stream endpoint announced");

        let poster = Arc::new(EndpointPoster {
            server,
            client: client.clone(),
            endpoint,
            headers,
        });
        let reader = tokio::spawn(reader_loop(source, rpc, Arc::clone(&poster)));

        Ok(Self { poster, reader })
    }

    pub(crate) fn sink(&self) -> &dyn FrameSink {
        self.poster.as_ref()
    }

    /// Drop the stream; pending requests are failed by the connection.
    pub(crate) fn close(&self) {
        self.reader.abort();
    }
}

impl Drop for EventStreamTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl FrameSink for EndpointPoster {
    async fn send_frame(&self, frame: &Value) -> Result<(), ToolInvokeError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(frame)
            .send()
            .await
            .map_err(|err| ToolInvokeError::Transport {
                server: self.server.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ToolInvokeError::Auth {
                server: self.server.clone(),
                message: format!("endpoint returned {status}"),
            });
        }
        if !status.is_success() {
            return Err(ToolInvokeError::Transport {
                server: self.server.clone(),
                message: format!("endpoint returned {status}"),
            });
        }
        Ok(())
    }
}

async fn reader_loop(mut source: EventSource, rpc: Arc<RpcState>, poster: Arc<EndpointPoster>) {
    while let Some(item) = source.next().await {
        match item {
            Ok(Event::Message(message)) if message.event == MESSAGE_EVENT => {
                match serde_json::from_str::<Value>(&message.data) {
                    Ok(value) => rpc.route(value, poster.as_ref()).await,
                    Err(err) => {
                        warn!(
                            server = %rpc.server(),
                            %err,
                            "received invalid JSON from MCP server"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(err) => {
                warn!(server = %rpc.server(), %err, "Event stream failed");
                break;
            }
        }
    }

    source.close();
    debug!(server = %rpc.server(), "Event stream closed");
    rpc.fail_all().await;
}

fn classify(server: &str, err: reqwest_eventsource::Error) -> ToolInvokeError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _)
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN =>
        {
            ToolInvokeError::Auth {
                server: server.to_string(),
                message: format!("event stream returned {status}"),
            }
        }
        reqwest_eventsource::Error::StreamEnded => ToolInvokeError::Terminated {
            server: server.to_string(),
        },
        other => ToolInvokeError::Transport {
            server: server.to_string(),
            message: other.to_string(),
        },
    }
}
