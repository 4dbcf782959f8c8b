use crate::constants::status;
use crate::error::ThroneError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of conversation as it crosses the gateway and HTTP boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        use crate::constants::generation;
        Self {
            temperature: generation::TEMPERATURE,
            top_p: generation::TOP_P,
            max_tokens: generation::MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Parsed chat-completion answer from the primary provider.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub text: String,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Timing and token counters reported by Ollama's generate endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateStats {
    pub eval_count: Option<u64>,
    pub eval_duration: Option<u64>,
    pub load_duration: Option<u64>,
    pub prompt_eval_count: Option<u64>,
}

/// Parsed single-turn generation from the secondary provider.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub model: String,
    pub stats: GenerateStats,
}

/// A provider answer before it is normalized into a [`ProviderReply`].
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    Primary(ChatCompletion),
    Secondary(GenerateResponse),
}

impl ProviderResponse {
    /// Normalize into a reply, substituting `empty_text` for a blank body.
    pub fn into_reply(self, empty_text: &str) -> ProviderReply {
        let fill = |text: String| {
            if text.trim().is_empty() {
                empty_text.to_string()
            } else {
                text
            }
        };
        match self {
            ProviderResponse::Primary(completion) => ProviderReply {
                text: fill(completion.text),
                source: ReplySource::Primary,
                model_name: completion.model,
                timestamp: Utc::now(),
                diagnostics: Some(serde_json::json!({
                    "usage": completion.usage,
                })),
            },
            ProviderResponse::Secondary(generation) => ProviderReply {
                text: fill(generation.text),
                source: ReplySource::Secondary,
                model_name: generation.model,
                timestamp: Utc::now(),
                diagnostics: Some(serde_json::json!({
                    "ollama_stats": generation.stats,
                })),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Primary,
    Secondary,
    StaticFallback,
}

impl ReplySource {
    /// Status label reported alongside a reply over HTTP.
    pub fn status(&self) -> &'static str {
        match self {
            ReplySource::Primary => status::PRIMARY_OK,
            ReplySource::Secondary => status::SECONDARY_OK,
            ReplySource::StaticFallback => status::STATIC_FALLBACK,
        }
    }
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplySource::Primary => write!(f, "primary"),
            ReplySource::Secondary => write!(f, "secondary"),
            ReplySource::StaticFallback => write!(f, "static_fallback"),
        }
    }
}

/// The single reply shape every tier of the gateway resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderReply {
    pub text: String,
    pub source: ReplySource,
    pub model_name: String,
    pub timestamp: DateTime<Utc>,
    pub diagnostics: Option<Value>,
}

impl ProviderReply {
    /// True when the reply was produced for a request that was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.get("cancelled"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A model installed on the local provider, as reported by `/api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: Value,
}

/// Multi-turn chat-completion provider consulted first.
#[async_trait::async_trait]
pub trait PrimaryProvider: Send + Sync {
    /// Model used when the caller does not name one.
    fn default_model(&self) -> &str;

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatTurn],
        params: &DecodingParams,
    ) -> Result<ChatCompletion, ThroneError>;
}

/// Single-turn local generation provider.
#[async_trait::async_trait]
pub trait SecondaryProvider: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &DecodingParams,
    ) -> Result<GenerateResponse, ThroneError>;

    async fn list_models(&self) -> Result<Vec<LocalModel>, ThroneError>;
}
