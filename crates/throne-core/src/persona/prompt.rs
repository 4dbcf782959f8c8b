use super::config::PersonaConfig;
use super::memory::MemoryArchive;
use crate::constants::persona::MEMORY_LIMIT;
use crate::llm::ChatTurn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    #[default]
    Scripted,
    MemoryAugmented,
}

/// Inputs that determine the rendered system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOptions {
    pub mode: PromptMode,
    pub memory_archive: Option<PathBuf>,
    pub memory_limit: usize,
    pub overlay: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            mode: PromptMode::Scripted,
            memory_archive: None,
            memory_limit: MEMORY_LIMIT,
            overlay: false,
        }
    }
}

/// Builds the system instructions sent to the language model. The base
/// prompt is rendered once per configuration and reused.
#[derive(Debug)]
pub struct PromptBuilder {
    persona: PersonaConfig,
    options: PromptOptions,
    cache: OnceLock<String>,
}

impl PromptBuilder {
    pub fn new(persona: PersonaConfig) -> Self {
        Self {
            persona,
            options: PromptOptions::default(),
            cache: OnceLock::new(),
        }
    }

    pub fn with_mode(mut self, mode: PromptMode) -> Self {
        self.options.mode = mode;
        self
    }

    pub fn with_memory_archive(mut self, path: Option<PathBuf>) -> Self {
        self.options.memory_archive = path;
        self
    }

    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.options.memory_limit = limit;
        self
    }

    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.options.overlay = overlay;
        self
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    /// Replace the inputs and drop the memoized prompt.
    pub fn reconfigure(&mut self, persona: PersonaConfig, options: PromptOptions) {
        self.persona = persona;
        self.options = options;
        self.cache = OnceLock::new();
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    pub fn build_system_prompt(&self) -> String {
        self.cache.get_or_init(|| self.render()).clone()
    }

    /// Base prompt plus the persona overlay when enabled.
    pub fn system_prompt_for(&self, recent_turns: &[ChatTurn]) -> String {
        let base = self.build_system_prompt();
        if self.options.overlay {
            self.persona.overlay(&base, recent_turns)
        } else {
            base
        }
    }

    fn render(&self) -> String {
        match self.options.mode {
            PromptMode::Scripted => self.persona.scripted_prompt(),
            PromptMode::MemoryAugmented => {
                let Some(path) = self.options.memory_archive.as_ref() else {
                    tracing::warn!("Memory-augmented prompt requested without an archive; using scripted prompt");
                    return self.persona.scripted_prompt();
                };
                match MemoryArchive::load(path) {
                    Ok(archive) => {
                        let memories = archive.extract_key_memories(self.options.memory_limit);
                        tracing::info!(
                            "Loaded {} memories from {}",
                            memories.len(),
                            path.display()
                        );
                        self.persona.memory_prompt(&memories)
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load memory archive {}: {}; using scripted prompt",
                            path.display(),
                            e
                        );
                        self.persona.scripted_prompt()
                    }
                }
            }
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PersonaConfig::default())
    }
}
