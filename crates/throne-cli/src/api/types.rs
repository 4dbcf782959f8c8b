use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use throne_core::llm::LocalModel;
use throne_core::{ChatTurn, ReplySource};

// Chat endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "useOpenAI")]
    pub use_openai: Option<bool>,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

/// Reply plus whatever diagnostics the resolving tier attached, flattened
/// into the top-level object.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub status: &'static str,
    pub source: ReplySource,
    #[serde(flatten)]
    pub diagnostics: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatInfoResponse {
    pub message: &'static str,
    pub description: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

// Model listing
#[derive(Debug, Serialize)]
pub struct PrimaryModelInfo {
    pub name: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<LocalModel>,
    pub primary_models: Vec<PrimaryModelInfo>,
    pub count: usize,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub timestamp: DateTime<Utc>,
}
