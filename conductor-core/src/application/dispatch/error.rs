use crate::application::tooling::ToolInvokeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("failed to execute tool '{tool}': {source}")]
    Execution {
        tool: String,
        #[source]
        source: ToolInvokeError,
    },
    #[error("tool '{tool}' reported a failure: {message}")]
    Failed { tool: String, message: String },
}

impl ToolError {
    pub fn tool(&self) -> &str {
        match self {
            ToolError::UnknownTool(tool)
            | ToolError::InvalidArguments { tool, .. }
            | ToolError::Execution { tool, .. }
            | ToolError::Failed { tool, .. } => tool,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ToolError::UnknownTool(name) => {
                format!("The tool \"{name}\" is not available on any connected server.")
            }
            ToolError::InvalidArguments { tool, reason } => {
                format!("The tool \"{tool}\" could not be called with those arguments: {reason}.")
            }
            ToolError::Execution { tool, source } => match source {
                ToolInvokeError::Timeout { .. } => {
                    format!("The tool \"{tool}\" took too long to answer.")
                }
                _ => format!("The tool \"{tool}\" could not be reached right now."),
            },
            ToolError::Failed { tool, message } => {
                format!("The tool \"{tool}\" failed: {message}")
            }
        }
    }
}
