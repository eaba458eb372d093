use std::collections::HashMap;
use std::time::Duration;

use jarvis::assistant::Language;
use jarvis::config::{AssistantConfig, ENV_API_URL, ENV_LLM_API_KEY, ENV_LOCALE, ENV_TIMEOUT_MS};
use jarvis::error::ConfigError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = AssistantConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.llm_model, "gemini-2.0-flash");
    assert_eq!(config.planner_api_url, "http://localhost:3000/api");
    assert_eq!(config.request_timeout(), Duration::from_secs(15));
    assert!(config.llm_api_key.is_none());
}

#[test]
fn test_env_overrides() {
    let config = AssistantConfig::from_lookup(lookup(&[
        (ENV_API_URL, "http://planner.local/api"),
        (ENV_LLM_API_KEY, "secret"),
        (ENV_TIMEOUT_MS, "2500"),
    ]))
    .unwrap();
    assert_eq!(config.planner_api_url, "http://planner.local/api");
    assert_eq!(config.llm_api_key.as_deref(), Some("secret"));
    assert_eq!(config.request_timeout(), Duration::from_millis(2500));
}

#[test]
fn test_invalid_timeout() {
    let err = AssistantConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_TIMEOUT_MS));

    let zero = AssistantConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "0")]));
    assert!(zero.is_err());
}

#[test]
fn test_partial_config_file() {
    let config: AssistantConfig = serde_json::from_str(r#"{ "llm_model": "gemini-1.5-pro" }"#).unwrap();
    assert_eq!(config.llm_model, "gemini-1.5-pro");
    assert_eq!(config.request_timeout_ms, 15_000, "Missing keys keep their defaults");
}

#[test]
fn test_locale_selects_language() {
    let config = AssistantConfig::from_lookup(lookup(&[(ENV_LOCALE, " fa-IR ")])).unwrap();
    assert_eq!(config.locale, "fa-IR");
    let language = Language::for_locale(&config.locale).unwrap();
    assert!(language.lexicon.is_negation("نه"));

    assert!(Language::for_locale("en_US").is_some());
    assert!(Language::for_locale("de").is_none());

    let err = AssistantConfig::from_lookup(lookup(&[(ENV_LOCALE, "de")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_LOCALE));
}
