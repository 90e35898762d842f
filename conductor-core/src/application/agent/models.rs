use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_TURNS: usize = 5;

/// One executed (or attempted) tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub arguments: BTreeMap<String, String>,
    pub success: bool,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentOutcome {
    pub response: String,
    pub steps: Vec<AgentStep>,
    pub turns: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOptions {
    /// Upper bound on selection rounds within one user turn.
    pub max_turns: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}
