use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{endpoints, generation, models, persona, server, sessions};
use crate::error::ThroneError;
use crate::llm::{DecodingParams, OllamaClient, OpenAIClient, ProviderGateway};
use crate::persona::{PersonaConfig, PromptBuilder, PromptMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub primary: PrimarySettings,
    #[serde(default)]
    pub secondary: SecondarySettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub persona: PersonaSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Cloud chat-completion provider consulted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimarySettings {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    /// Model names containing this marker belong to the primary provider.
    pub model_prefix: String,
    pub timeout_secs: u64,
}

/// Local Ollama server consulted when the primary is unavailable or not selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondarySettings {
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub history_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaSettings {
    pub prompt_mode: PromptMode,
    /// Conversation-export archive used by the memory-augmented prompt.
    pub memory_archive: Option<PathBuf>,
    pub memory_limit: usize,
    /// Append the persona voice block and recent-turn summary to the prompt.
    pub overlay: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Storage file; `None` means the default under the data directory.
    pub path: Option<PathBuf>,
    pub max_sessions_per_device: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for PrimarySettings {
    fn default() -> Self {
        Self {
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
            model: models::DEFAULT_PRIMARY_MODEL.to_string(),
            api_key_env: endpoints::OPENAI_API_KEY_ENV.to_string(),
            model_prefix: models::PRIMARY_MODEL_PREFIX.to_string(),
            timeout_secs: generation::PRIMARY_TIMEOUT_SECS,
        }
    }
}

impl Default for SecondarySettings {
    fn default() -> Self {
        Self {
            base_url: endpoints::OLLAMA_BASE_URL.to_string(),
            default_model: models::DEFAULT_LOCAL_MODEL.to_string(),
            timeout_secs: generation::SECONDARY_TIMEOUT_SECS,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: generation::TEMPERATURE,
            top_p: generation::TOP_P,
            max_tokens: generation::MAX_TOKENS,
            history_window: generation::HISTORY_WINDOW,
        }
    }
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            prompt_mode: PromptMode::Scripted,
            memory_archive: None,
            memory_limit: persona::MEMORY_LIMIT,
            overlay: false,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_sessions_per_device: sessions::MAX_SESSIONS_PER_DEVICE,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: server::DEFAULT_BIND.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary: PrimarySettings::default(),
            secondary: SecondarySettings::default(),
            generation: GenerationSettings::default(),
            persona: PersonaSettings::default(),
            storage: StorageSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("throne-room")
            .join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ThroneError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ThroneError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the primary API key from the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        if self.primary.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.primary.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Resolved storage file for sessions and the device identifier.
    pub fn storage_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("throne-room")
                .join("storage.json")
        })
    }

    pub fn decoding_params(&self) -> DecodingParams {
        DecodingParams {
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            max_tokens: self.generation.max_tokens,
        }
    }

    pub fn build_prompt_builder(&self) -> PromptBuilder {
        PromptBuilder::new(PersonaConfig::default())
            .with_mode(self.persona.prompt_mode)
            .with_memory_archive(self.persona.memory_archive.clone())
            .with_memory_limit(self.persona.memory_limit)
            .with_overlay(self.persona.overlay)
    }

    /// Build the provider gateway described by these settings. The primary
    /// client is only wired in when its API key is present.
    pub fn build_gateway(&self) -> Result<ProviderGateway, ThroneError> {
        let primary = match self.api_key() {
            Some(key) => Some(
                OpenAIClient::new(key)
                    .with_model(self.primary.model.clone())
                    .with_base_url(self.primary.base_url.clone())
                    .with_timeout(Duration::from_secs(self.primary.timeout_secs))?,
            ),
            None => {
                tracing::info!(
                    "{} not set; primary provider disabled",
                    self.primary.api_key_env
                );
                None
            }
        };

        let secondary = OllamaClient::new(self.secondary.base_url.clone())
            .with_timeout(Duration::from_secs(self.secondary.timeout_secs))?;

        let mut gateway = ProviderGateway::new(Box::new(secondary), self.build_prompt_builder())
            .with_decoding(self.decoding_params())
            .with_history_window(self.generation.history_window)
            .with_local_default(self.secondary.default_model.clone())
            .with_primary_prefix(self.primary.model_prefix.clone())
            .with_deadlines(
                Duration::from_secs(self.primary.timeout_secs),
                Duration::from_secs(self.secondary.timeout_secs),
            );
        if let Some(primary) = primary {
            gateway = gateway.with_primary(Box::new(primary));
        }
        Ok(gateway)
    }
}
