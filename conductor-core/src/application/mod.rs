pub mod agent;
pub mod dispatch;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod tooling;
