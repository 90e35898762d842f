//! The plan → execute → reflect loop behind every user turn.

pub mod errors;
pub mod models;
pub mod parser;
mod runner;

#[cfg(test)]
mod tests;

pub use errors::AgentError;
pub use models::{AgentOptions, AgentOutcome, AgentStep, DEFAULT_MAX_TURNS};
pub use parser::{Selection, parse_selection, parse_verdict};
pub use runner::Agent;
