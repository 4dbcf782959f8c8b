use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThroneError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider unavailable: {provider}: {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("A reply is already pending")]
    Busy,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ThroneError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the error should be shown to the caller as a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_) | Self::Busy)
    }
}

pub type Result<T> = std::result::Result<T, ThroneError>;
