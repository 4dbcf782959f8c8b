mod config;
pub mod memory;
mod prompt;

pub use config::PersonaConfig;
pub use memory::{ArchiveStats, MemoryArchive};
pub use prompt::{PromptBuilder, PromptMode, PromptOptions};
