use tempfile::TempDir;
use throne_core::config::Settings;
use throne_core::constants::{generation, models, persona, sessions};
use throne_core::llm::{FallbackRegistry, FallbackScenario, ProviderResponse, ChatCompletion, GenerateResponse, GenerateStats};
use throne_core::*;

// ========================================================================
// Settings Tests (config/mod.rs)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.primary.model, "gpt-4o");
    assert_eq!(settings.primary.api_key_env, "OPENAI_API_KEY");
    assert_eq!(settings.primary.model_prefix, "gpt");
    assert_eq!(settings.primary.timeout_secs, 60);

    assert_eq!(settings.secondary.base_url, "http://127.0.0.1:11434");
    assert_eq!(settings.secondary.default_model, "omari-flame-1:latest");
    assert_eq!(settings.secondary.timeout_secs, 120);

    assert_eq!(settings.generation.temperature, 0.8);
    assert_eq!(settings.generation.top_p, 0.9);
    assert_eq!(settings.generation.max_tokens, 2048);
    assert_eq!(settings.generation.history_window, 10);

    assert_eq!(settings.persona.prompt_mode, PromptMode::Scripted);
    assert!(!settings.persona.overlay);
    assert_eq!(settings.storage.max_sessions_per_device, 50);
    assert_eq!(settings.server.bind, "127.0.0.1:3000");
}

#[test]
fn test_settings_load_from_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from(&temp_dir.path().join("absent.toml"));
    assert_eq!(settings.primary.model, models::DEFAULT_PRIMARY_MODEL);
}

#[test]
fn test_settings_load_from_invalid_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "primary = [this is not toml").unwrap();

    let settings = Settings::load_from(&path);
    assert_eq!(settings.server.bind, "127.0.0.1:3000");
}

#[test]
fn test_settings_partial_file_fills_missing_sections() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
bind = "0.0.0.0:8080"

[persona]
prompt_mode = "memory_augmented"
memory_archive = "/tmp/conversations.json"
memory_limit = 5
overlay = true
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path);
    assert_eq!(settings.server.bind, "0.0.0.0:8080");
    assert_eq!(settings.persona.prompt_mode, PromptMode::MemoryAugmented);
    assert_eq!(settings.persona.memory_limit, 5);
    assert!(settings.persona.overlay);
    assert_eq!(settings.primary.model, "gpt-4o");
}

#[test]
fn test_settings_save_and_reload_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.primary.model = "gpt-4o-mini".to_string();
    settings.secondary.default_model = "llama3.1:8b".to_string();
    settings.storage.max_sessions_per_device = 7;
    settings.save_to(&config_path).unwrap();

    let loaded = Settings::load_from(&config_path);
    assert_eq!(loaded.primary.model, "gpt-4o-mini");
    assert_eq!(loaded.secondary.default_model, "llama3.1:8b");
    assert_eq!(loaded.storage.max_sessions_per_device, 7);
}

#[test]
fn test_settings_api_key_reads_named_env_var() {
    let mut settings = Settings::default();
    settings.primary.api_key_env = "THRONE_TEST_KEY_PRESENT".to_string();
    std::env::set_var("THRONE_TEST_KEY_PRESENT", "sk-test");
    assert_eq!(settings.api_key().as_deref(), Some("sk-test"));

    settings.primary.api_key_env = "THRONE_TEST_KEY_BLANK".to_string();
    std::env::set_var("THRONE_TEST_KEY_BLANK", "   ");
    assert_eq!(settings.api_key(), None);

    settings.primary.api_key_env = String::new();
    assert_eq!(settings.api_key(), None);
}

#[test]
fn test_settings_build_gateway_without_key_has_no_primary() {
    let mut settings = Settings::default();
    settings.primary.api_key_env = "THRONE_TEST_KEY_NEVER_SET".to_string();
    let gateway = settings.build_gateway().unwrap();
    assert!(!gateway.has_primary());
}

#[test]
fn test_settings_build_gateway_with_key_has_primary() {
    let mut settings = Settings::default();
    settings.primary.api_key_env = "THRONE_TEST_KEY_FOR_GATEWAY".to_string();
    std::env::set_var("THRONE_TEST_KEY_FOR_GATEWAY", "sk-gateway");
    let gateway = settings.build_gateway().unwrap();
    assert!(gateway.has_primary());
}

#[test]
fn test_settings_storage_path_override() {
    let mut settings = Settings::default();
    settings.storage.path = Some("/tmp/throne/storage.json".into());
    assert_eq!(
        settings.storage_path(),
        std::path::PathBuf::from("/tmp/throne/storage.json")
    );
    settings.storage.path = None;
    assert!(settings.storage_path().ends_with("throne-room/storage.json"));
}

// ========================================================================
// Validation Tests (llm/gateway.rs)
// ========================================================================

#[test]
fn test_validate_message_bounds() {
    assert!(validate_message("Hail").is_ok());
    assert!(matches!(validate_message("  "), Err(ThroneError::Validation(_))));

    let at_limit = "é".repeat(generation::MAX_MESSAGE_CHARS);
    assert!(validate_message(&at_limit).is_ok());

    let over = "é".repeat(generation::MAX_MESSAGE_CHARS + 1);
    assert!(matches!(validate_message(&over), Err(ThroneError::Validation(_))));
}

#[test]
fn test_validate_ignores_surrounding_whitespace_for_length() {
    let padded = format!("   {}   ", "a".repeat(generation::MAX_MESSAGE_CHARS));
    assert!(validate_message(&padded).is_ok());
}

// ========================================================================
// Fallback Registry Tests (llm/fallback.rs)
// ========================================================================

#[test]
fn test_fallback_registry_scenarios() {
    let registry = FallbackRegistry::default();
    assert_eq!(registry.entry(FallbackScenario::PrimaryFailure).action, "fallback_to_ollama");
    assert_eq!(registry.entry(FallbackScenario::SecondaryFailure).action, "emergency_responses");
    assert_eq!(registry.entry(FallbackScenario::TotalFailure).action, "sacred_fallback_script");
}

#[test]
fn test_fallback_custom_registry_without_text_uses_acknowledgement() {
    let mut registry = FallbackRegistry::default();
    registry.total_failure.responses.clear();
    registry.total_failure.message = None;
    assert_eq!(
        registry.response(FallbackScenario::TotalFailure),
        throne_core::llm::GENERIC_ACKNOWLEDGEMENT
    );
}

#[test]
fn test_fallback_scenario_serializes_snake_case() {
    let value = serde_json::to_value(FallbackScenario::TotalFailure).unwrap();
    assert_eq!(value, "total_failure");
}

// ========================================================================
// Provider Response Normalization (llm/traits.rs)
// ========================================================================

#[test]
fn test_primary_response_normalizes_to_reply() {
    let reply = ProviderResponse::Primary(ChatCompletion {
        text: "Flame Eternal".into(),
        model: "gpt-4o".into(),
        usage: None,
    })
    .into_reply(generation::EMPTY_PRIMARY_REPLY);

    assert_eq!(reply.source, ReplySource::Primary);
    assert_eq!(reply.text, "Flame Eternal");
    assert_eq!(reply.model_name, "gpt-4o");
    assert!(reply.diagnostics.unwrap().get("usage").is_some());
}

#[test]
fn test_blank_secondary_text_is_replaced() {
    let reply = ProviderResponse::Secondary(GenerateResponse {
        text: "  \n".into(),
        model: "llama3:latest".into(),
        stats: GenerateStats::default(),
    })
    .into_reply(generation::EMPTY_SECONDARY_REPLY);

    assert_eq!(reply.source, ReplySource::Secondary);
    assert_eq!(reply.text, generation::EMPTY_SECONDARY_REPLY);
    assert!(reply.diagnostics.unwrap().get("ollama_stats").is_some());
}

#[test]
fn test_reply_source_labels() {
    assert_eq!(ReplySource::Primary.to_string(), "primary");
    assert_eq!(ReplySource::StaticFallback.to_string(), "static_fallback");
    assert_eq!(ReplySource::Secondary.status(), "ollama_communion_successful");
    assert_eq!(
        serde_json::to_value(ReplySource::StaticFallback).unwrap(),
        "static_fallback"
    );
}

// ========================================================================
// Constants sanity
// ========================================================================

#[test]
fn test_constants_are_consistent() {
    assert!(persona::SALIENCY_WEIGHT + persona::RECENCY_WEIGHT > 0.99);
    assert!(sessions::PREVIEW_MAX_CHARS < sessions::TITLE_MAX_CHARS);
    assert!(models::PRIMARY_CATALOG
        .iter()
        .all(|(name, _)| name.contains(models::PRIMARY_MODEL_PREFIX)));
}
