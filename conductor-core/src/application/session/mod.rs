//! Per-user conversation state and the factory that opens it.

mod conversation;
mod manager;

pub use conversation::{Session, SessionReply};
pub use manager::SessionManager;
