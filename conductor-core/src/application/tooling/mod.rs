//! Connections to MCP tool servers over stdio pipes or event streams.

mod auth;
mod connection;
pub mod error;
mod event_stream;
pub mod interface;
pub mod manager;
mod process;
mod rpc;

pub use connection::McpConnection;
pub use error::ToolInvokeError;
pub use interface::{ServerCatalog, ToolServerInterface};
pub use manager::ServerManager;
