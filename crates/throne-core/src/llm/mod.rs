mod traits;
mod fallback;
mod gateway;
mod ollama;
mod openai;

pub use traits::*;
pub use fallback::{FallbackRegistry, FallbackScenario, ScenarioEntry, GENERIC_ACKNOWLEDGEMENT};
pub use gateway::{validate_message, ProviderGateway, ReplyRequest};
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
