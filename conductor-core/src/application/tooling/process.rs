use super::error::ToolInvokeError;
use super::rpc::{FrameSink, RpcState};
use crate::config::StdioParams;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Subprocess transport: newline-delimited JSON-RPC over the child's pipes.
pub(crate) struct StdioTransport {
    server: String,
    writer: Arc<LineWriter>,
    child: AsyncMutex<Option<Child>>,
    reader: JoinHandle<()>,
}

struct LineWriter {
    server: String,
    stream: AsyncMutex<Option<BufWriter<ChildStdin>>>,
}

impl StdioTransport {
    pub(crate) fn spawn(params: &StdioParams, rpc: Arc<RpcState>) -> Result<Self, ToolInvokeError> {
        let server = rpc.server().to_string();
        let mut command = Command::new(&params.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &params.workdir {
            command.current_dir(dir);
        }
        if !params.args.is_empty() {
            command.args(&params.args);
        }
        for (key, value) in &params.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: server.clone(),
            source,
        })?;
        debug!(server = %server, pid = child.id(), "Spawned MCP server process");

        let transport_error = |message: &str| ToolInvokeError::Transport {
            server: server.clone(),
            message: message.to_string(),
        };
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| transport_error("failed to capture server stdout"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(server.clone(), stderr));
        }

        let writer = Arc::new(LineWriter {
            server: server.clone(),
            stream: AsyncMutex::new(Some(BufWriter::new(stdin))),
        });
        let reader = tokio::spawn(reader_loop(rpc, Arc::clone(&writer), stdout));

        Ok(Self {
            server,
            writer,
            child: AsyncMutex::new(Some(child)),
            reader,
        })
    }

    pub(crate) fn sink(&self) -> &dyn FrameSink {
        self.writer.as_ref()
    }

    /// Kill and reap the child; the reader loop ends on EOF and fails any
    /// pending requests.
    pub(crate) async fn close(&self) {
        self.writer.shutdown().await;
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(err) = child.kill().await {
                debug!(
                    server = %self.server,
                    %err,
                    "failed to kill MCP server process (may have already exited)"
                );
            }
            let _ = child.wait().await;
        }
        self.reader.abort();
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl LineWriter {
    async fn shutdown(&self) {
        self.stream.lock().await.take();
    }

    fn io_error(&self, source: std::io::Error) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.clone(),
            message: source.to_string(),
        }
    }
}

#[async_trait]
impl FrameSink for LineWriter {
    async fn send_frame(&self, frame: &Value) -> Result<(), ToolInvokeError> {
        let encoded =
            serde_json::to_string(frame).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.clone(),
                source,
            })?;

        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or_else(|| ToolInvokeError::Terminated {
            server: self.server.clone(),
        })?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| self.io_error(source))?;
        stream
            .write_all(b"\n")
            .await
            .map_err(|source| self.io_error(source))?;
        stream.flush().await.map_err(|source| self.io_error(source))?;
        Ok(())
    }
}

async fn reader_loop(rpc: Arc<RpcState>, writer: Arc<LineWriter>, stdout: ChildStdout) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(raw)) = lines.next_line().await {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('\u{1b}') {
            debug!(
                server = %rpc.server(),
                line = trimmed,
                "skipping non-JSON ANSI log line from MCP server"
            );
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => rpc.route(value, writer.as_ref()).await,
            Err(source) => {
                warn!(
                    server = %rpc.server(),
                    line = trimmed,
                    %source,
                    "received invalid JSON from MCP server"
                );
            }
        }
    }

    debug!(server = %rpc.server(), "MCP server stdout closed");
    writer.shutdown().await;
    rpc.fail_all().await;
}

async fn forward_stderr(server: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(server = %server, line = %line, "MCP server stderr");
    }
}
