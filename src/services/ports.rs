//! Traits for the external collaborators the assistant depends on.
//!
//! The controller talks to the outside world only through these, so tests
//! plug in fakes and the binary plugs in the HTTP clients.

use async_trait::async_trait;

use crate::assistant::intent::RawClassification;
use crate::domain::{DomainSnapshot, Mutation};
use crate::error::TransportError;

/// Recorded audio, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "audio/wav".to_string(),
        }
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Speech to text. An empty transcription is an error, not an empty string.
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TransportError>;
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// One intent tag plus entities for `utterance`, given what the planner
    /// currently holds. The result is advisory and gets normalized locally.
    async fn classify(
        &self,
        utterance: &str,
        snapshot: &DomainSnapshot,
    ) -> Result<RawClassification, TransportError>;
}

#[async_trait]
pub trait MutationApi: Send + Sync {
    async fn apply(&self, mutation: &Mutation) -> Result<(), TransportError>;
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<DomainSnapshot, TransportError>;
}
