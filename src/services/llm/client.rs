use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::prompt::{classification_prompt, TRANSCRIPTION_PROMPT};
use crate::assistant::intent::{parse_model_output, RawClassification};
use crate::config::AssistantConfig;
use crate::domain::DomainSnapshot;
use crate::error::TransportError;
use crate::services::ports::{AudioClip, IntentClassifier, Transcriber};

/// Client for a `generateContent` language model endpoint. Handles both
/// speech-to-text and intent classification.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, joined and trimmed.
    fn text(&self) -> String {
        let Some(content) = self.candidates.first().and_then(|c| c.content.as_ref()) else {
            return String::new();
        };
        content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

impl LlmClient {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout()) // Network-level timeout, no retries here
                .build()
                .unwrap_or_default(),
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
            api_key: config.llm_api_key.clone().filter(|k| !k.trim().is_empty()),
        }
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, TransportError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(TransportError::NotConfigured("language model API key"));
        };

        let body = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("language model returned {}", status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.text())
    }
}

#[async_trait]
impl Transcriber for LlmClient {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TransportError> {
        debug!("transcribing {} bytes of {}", clip.bytes.len(), clip.mime_type);
        let parts = vec![
            Part::Inline {
                inline_data: InlineData {
                    mime_type: clip.mime_type.clone(),
                    data: BASE64.encode(&clip.bytes),
                },
            },
            Part::Text {
                text: TRANSCRIPTION_PROMPT.to_string(),
            },
        ];
        let text = self.generate(parts).await?;
        if text.is_empty() {
            return Err(TransportError::EmptyTranscript);
        }
        Ok(text)
    }
}

#[async_trait]
impl IntentClassifier for LlmClient {
    async fn classify(
        &self,
        utterance: &str,
        snapshot: &DomainSnapshot,
    ) -> Result<RawClassification, TransportError> {
        let parts = vec![
            Part::Text {
                text: classification_prompt(snapshot),
            },
            Part::Text {
                text: format!("\n\nUser message:\n\"{}\"", utterance),
            },
        ];
        let text = self.generate(parts).await?;
        parse_model_output(&text)
    }
}
