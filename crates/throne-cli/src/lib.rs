// Library interface for throne-cli
// This allows integration tests to drive the HTTP API and the chat loop.

pub mod api;
pub mod app;
pub mod commands;

// Re-export commonly used items for easier testing
pub use commands::{handle_command, CommandResult};
