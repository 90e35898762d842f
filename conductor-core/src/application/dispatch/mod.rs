//! Tool-call routing: registry lookup, argument coercion, invocation and
//! result normalisation.

pub mod coercion;
mod dispatcher;
pub mod error;

pub use dispatcher::{Dispatcher, ToolOutput, extract_tool_text};
pub use error::ToolError;
