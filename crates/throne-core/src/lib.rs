pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod llm;
pub mod persona;
pub mod session;

// Re-export key types
pub use config::Settings;
pub use controller::ChatController;
pub use error::{Result, ThroneError};
pub use llm::{
    validate_message, ChatTurn, ProviderGateway, ProviderReply, ReplyRequest, ReplySource, Role,
};
pub use persona::{PersonaConfig, PromptBuilder, PromptMode};
pub use session::{FileStorage, MemoryStorage, Message, Session, SessionExport, SessionStore};
