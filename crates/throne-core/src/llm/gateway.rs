use super::fallback::{FallbackRegistry, FallbackScenario};
use super::traits::*;
use crate::constants::{generation, models, persona, status};
use crate::error::{Result, ThroneError};
use crate::persona::PromptBuilder;
use chrono::Utc;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One user message plus the conversation that precedes it.
#[derive(Debug, Clone, Default)]
pub struct ReplyRequest {
    pub message: String,
    /// Prior turns, oldest first, not including `message`.
    pub history: Vec<ChatTurn>,
    pub model: Option<String>,
    pub prefer_primary: bool,
}

impl ReplyRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            model: None,
            prefer_primary: true,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_prefer_primary(mut self, prefer: bool) -> Self {
        self.prefer_primary = prefer;
        self
    }
}

/// Reject blank messages and messages longer than the accepted maximum.
pub fn validate_message(message: &str) -> Result<()> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ThroneError::Validation("Message is required".into()));
    }
    let chars = trimmed.chars().count();
    if chars > generation::MAX_MESSAGE_CHARS {
        return Err(ThroneError::Validation(format!(
            "Message is too long ({} characters, maximum {})",
            chars,
            generation::MAX_MESSAGE_CHARS
        )));
    }
    Ok(())
}

/// Routes a request through the primary provider, then the secondary, then
/// the static fallback. Always resolves to a reply.
pub struct ProviderGateway {
    primary: Option<Box<dyn PrimaryProvider>>,
    secondary: Box<dyn SecondaryProvider>,
    prompts: PromptBuilder,
    fallbacks: FallbackRegistry,
    params: DecodingParams,
    history_window: usize,
    local_default: String,
    primary_prefix: String,
    primary_deadline: Duration,
    secondary_deadline: Duration,
}

impl ProviderGateway {
    pub fn new(secondary: Box<dyn SecondaryProvider>, prompts: PromptBuilder) -> Self {
        Self {
            primary: None,
            secondary,
            prompts,
            fallbacks: FallbackRegistry::default(),
            params: DecodingParams::default(),
            history_window: generation::HISTORY_WINDOW,
            local_default: models::DEFAULT_LOCAL_MODEL.to_string(),
            primary_prefix: models::PRIMARY_MODEL_PREFIX.to_string(),
            primary_deadline: Duration::from_secs(generation::PRIMARY_TIMEOUT_SECS),
            secondary_deadline: Duration::from_secs(generation::SECONDARY_TIMEOUT_SECS),
        }
    }

    pub fn with_primary(mut self, primary: Box<dyn PrimaryProvider>) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackRegistry) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_decoding(mut self, params: DecodingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_local_default(mut self, model: impl Into<String>) -> Self {
        self.local_default = model.into();
        self
    }

    pub fn with_primary_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.primary_prefix = prefix.into();
        self
    }

    pub fn with_deadlines(mut self, primary: Duration, secondary: Duration) -> Self {
        self.primary_deadline = primary;
        self.secondary_deadline = secondary;
        self
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn prompts_mut(&mut self) -> &mut PromptBuilder {
        &mut self.prompts
    }

    pub fn fallbacks(&self) -> &FallbackRegistry {
        &self.fallbacks
    }

    /// Whether `model` follows the primary provider's naming convention.
    pub fn is_primary_model(&self, model: &str) -> bool {
        !self.primary_prefix.is_empty() && model.contains(&self.primary_prefix)
    }

    /// Model sent to the secondary provider for a requested model name.
    pub fn local_model_for(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) if !self.is_primary_model(model) => model.to_string(),
            _ => self.local_default.clone(),
        }
    }

    pub async fn list_local_models(&self) -> Result<Vec<LocalModel>> {
        self.secondary.list_models().await
    }

    /// Resolve a reply for `request`. Provider failures are logged and
    /// absorbed; cancellation skips straight to the static fallback.
    pub async fn get_reply(
        &self,
        request: &ReplyRequest,
        cancel: &CancellationToken,
    ) -> ProviderReply {
        let mut failures: Vec<Value> = Vec::new();

        if cancel.is_cancelled() {
            return self.static_reply(failures, true);
        }

        if request.prefer_primary {
            match self.try_primary(request, cancel).await {
                Some(Ok(reply)) => return reply,
                Some(Err(ThroneError::Cancelled)) => return self.static_reply(failures, true),
                Some(Err(e)) => {
                    warn!("Primary provider failed: {}", e);
                    info!("{}", self.fallbacks.response(FallbackScenario::PrimaryFailure));
                    failures.push(json!({
                        "scenario": FallbackScenario::PrimaryFailure.as_str(),
                        "action": self.fallbacks.entry(FallbackScenario::PrimaryFailure).action,
                        "error": e.to_string(),
                    }));
                }
                None => {}
            }
        }

        let model = self.local_model_for(request.model.as_deref());
        info!("Routing to secondary provider ({})", model);
        let outcome = self
            .bounded(
                "ollama",
                self.secondary_deadline,
                cancel,
                self.secondary.generate(&model, &request.message, &self.params),
            )
            .await;

        match outcome {
            Ok(generated) => {
                ProviderResponse::Secondary(generated).into_reply(generation::EMPTY_SECONDARY_REPLY)
            }
            Err(ThroneError::Cancelled) => self.static_reply(failures, true),
            Err(e) => {
                warn!("Secondary provider failed: {}", e);
                failures.push(json!({
                    "scenario": FallbackScenario::SecondaryFailure.as_str(),
                    "action": self.fallbacks.entry(FallbackScenario::SecondaryFailure).action,
                    "error": e.to_string(),
                }));
                self.static_reply(failures, false)
            }
        }
    }

    /// `None` when no primary provider is configured.
    async fn try_primary(
        &self,
        request: &ReplyRequest,
        cancel: &CancellationToken,
    ) -> Option<Result<ProviderReply>> {
        let Some(primary) = self.primary.as_ref() else {
            debug!("Primary provider not configured; skipping");
            return None;
        };

        // A local model name only applies to the secondary tier.
        let model = match request.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) if self.is_primary_model(model) => model.to_string(),
            _ => primary.default_model().to_string(),
        };

        let messages = self.primary_messages(request);
        info!("Routing to primary provider ({}, {} turns)", model, messages.len());

        let outcome = self
            .bounded(
                "openai",
                self.primary_deadline,
                cancel,
                primary.complete(&model, &messages, &self.params),
            )
            .await;

        Some(outcome.map(|completion| {
            ProviderResponse::Primary(completion).into_reply(generation::EMPTY_PRIMARY_REPLY)
        }))
    }

    /// System prompt, the trailing history window, then the new message.
    pub fn primary_messages(&self, request: &ReplyRequest) -> Vec<ChatTurn> {
        let start = request.history.len().saturating_sub(self.history_window);
        let window = &request.history[start..];

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(ChatTurn::system(self.prompts.system_prompt_for(window)));
        messages.extend(window.iter().cloned());
        messages.push(ChatTurn::user(request.message.clone()));
        messages
    }

    async fn bounded<T>(
        &self,
        provider: &str,
        deadline: Duration,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ThroneError::Cancelled),
            outcome = tokio::time::timeout(deadline, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ThroneError::provider(
                    provider,
                    format!("no response within {}s", deadline.as_secs_f32()),
                )),
            },
        }
    }

    fn static_reply(&self, failures: Vec<Value>, cancelled: bool) -> ProviderReply {
        let scenario = FallbackScenario::TotalFailure;
        if cancelled {
            info!("Request cancelled; resolving to static fallback");
        } else {
            warn!("All providers unavailable; using static fallback");
        }

        let mut diagnostics = json!({
            "error": status::TOTAL_FAILURE_ERROR,
            "scenario": scenario.as_str(),
            "sigil": persona::SIGIL,
            "failures": failures,
        });
        if cancelled {
            diagnostics["cancelled"] = Value::Bool(true);
        }

        ProviderReply {
            text: self.fallbacks.response(scenario),
            source: ReplySource::StaticFallback,
            model_name: persona::CODENAME.to_string(),
            timestamp: Utc::now(),
            diagnostics: Some(diagnostics),
        }
    }
}
