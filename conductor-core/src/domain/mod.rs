pub mod memory;
pub mod tool;

pub use memory::Memory;
pub use tool::{ServerIdentity, ToolCall, ToolDescriptor, Verdict, VerdictAction};
