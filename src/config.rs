use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assistant::Language;
use crate::error::ConfigError;

pub const ENV_CONFIG_FILE: &str = "JARVIS_CONFIG";
pub const ENV_LLM_URL: &str = "JARVIS_LLM_URL";
pub const ENV_LLM_MODEL: &str = "JARVIS_LLM_MODEL";
pub const ENV_LLM_API_KEY: &str = "JARVIS_LLM_API_KEY";
pub const ENV_API_URL: &str = "JARVIS_API_URL";
pub const ENV_TIMEOUT_MS: &str = "JARVIS_TIMEOUT_MS";
pub const ENV_LOCALE: &str = "JARVIS_LOCALE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base of the generateContent endpoint, without the `/v1beta` suffix.
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    /// Base URL of the planner REST API, e.g. `http://localhost:3000/api`.
    pub planner_api_url: String,
    pub request_timeout_ms: u64,
    /// Language tag selecting the rule tables, e.g. `en` or `fa-IR`.
    pub locale: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            llm_base_url: "https://generativelanguage.googleapis.com".to_string(),
            llm_model: "gemini-2.0-flash".to_string(),
            llm_api_key: None,
            planner_api_url: "http://localhost:3000/api".to_string(),
            request_timeout_ms: 15_000,
            locale: "en".to_string(),
        }
    }
}

impl AssistantConfig {
    /// Defaults, then the JSON file named by `JARVIS_CONFIG`, then the
    /// individual `JARVIS_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_CONFIG_FILE) {
            Some(path) if !path.trim().is_empty() => Self::load_file(path.trim())?,
            _ => Self::default(),
        };

        if let Some(url) = lookup(ENV_LLM_URL) {
            config.llm_base_url = url;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            config.llm_model = model;
        }
        if let Some(key) = lookup(ENV_LLM_API_KEY) {
            config.llm_api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            config.planner_api_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.request_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }

        if let Some(locale) = lookup(ENV_LOCALE) {
            config.locale = locale.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS,
                value: "0".to_string(),
            });
        }
        if !Language::supports(&self.locale) {
            return Err(ConfigError::InvalidValue {
                key: ENV_LOCALE,
                value: self.locale.clone(),
            });
        }
        if self.llm_api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            warn!("{} is not set; transcription and classification will fail", ENV_LLM_API_KEY);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
