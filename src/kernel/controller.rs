use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::event::{DialogueEvent, SideEffect};
use super::state::DialogueState;
use super::telemetry::{TelemetryRecorder, TelemetrySnapshot};
use super::transition::{transition, TurnContext};
use crate::assistant::handlers::Page;
use crate::assistant::intent::{normalize, NormalizedIntent};
use crate::assistant::Language;
use crate::domain::DomainSnapshot;
use crate::error::TransportError;
use crate::services::ports::{AudioClip, IntentClassifier, MutationApi, SnapshotSource, Transcriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What one call into the controller produced for the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutput {
    pub replies: Vec<String>,
    pub navigate: Option<Page>,
}

impl TurnOutput {
    pub fn text(&self) -> String {
        self.replies.join("\n\n")
    }
}

/// Drives one dialogue session: feeds events through [`transition`] and
/// executes the side effects it returns.
///
/// Turns are strictly sequential. Each call awaits the classifier and the
/// mutation API to completion before returning, so two utterances never
/// race on the same state. Give every session its own controller.
pub struct DialogueController {
    session: SessionId,
    state: DialogueState,
    language: Language,
    snapshot: DomainSnapshot,
    classifier: Arc<dyn IntentClassifier>,
    mutations: Arc<dyn MutationApi>,
    telemetry: TelemetryRecorder,
    today: Option<NaiveDate>,
    turns: u64,
}

impl DialogueController {
    pub fn new(classifier: Arc<dyn IntentClassifier>, mutations: Arc<dyn MutationApi>) -> Self {
        let session = SessionId::new();
        info!("dialogue session {} started", session);
        Self {
            session,
            state: DialogueState::new(),
            language: Language::standard(),
            snapshot: DomainSnapshot::default(),
            classifier,
            mutations,
            telemetry: TelemetryRecorder::new(),
            today: None,
            turns: 0,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Pins the reference date instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn snapshot(&self) -> &DomainSnapshot {
        &self.snapshot
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn telemetry_recorder(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    /// Replaces the planner data handlers resolve against. Call before each turn.
    pub fn set_snapshot(&mut self, snapshot: DomainSnapshot) {
        self.snapshot = snapshot;
    }

    /// Pulls a fresh snapshot. On failure the previous one is kept.
    pub async fn refresh_snapshot(&mut self, source: &dyn SnapshotSource) -> Result<(), TransportError> {
        match source.snapshot().await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                Ok(())
            }
            Err(e) => {
                warn!("snapshot refresh failed, keeping the previous one: {}", e);
                Err(e)
            }
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub async fn handle_transcript(&mut self, text: &str) -> TurnOutput {
        self.turns += 1;
        self.run(DialogueEvent::Utterance(text.to_string())).await
    }

    /// Transcribes `clip` and handles the text. A transcription failure
    /// leaves the dialogue where it was.
    pub async fn handle_audio(&mut self, transcriber: &dyn Transcriber, clip: &AudioClip) -> TurnOutput {
        match transcriber.transcribe(clip).await {
            Ok(text) => {
                debug!("transcribed {} chars", text.chars().count());
                self.handle_transcript(&text).await
            }
            Err(e) => self.transport_failed(e.to_string()).await,
        }
    }

    /// Microphone or other capture-side failure reported by the caller.
    pub async fn transport_failed(&mut self, reason: String) -> TurnOutput {
        self.run(DialogueEvent::TransportFailed(reason)).await
    }

    pub async fn confirm(&mut self) -> TurnOutput {
        self.run(DialogueEvent::Confirm).await
    }

    pub async fn cancel(&mut self) -> TurnOutput {
        self.run(DialogueEvent::Cancel).await
    }

    /// Ends the session and returns its telemetry summary.
    pub fn finish(mut self) -> TelemetrySnapshot {
        let summary = self.telemetry.aggregate_session(self.turns);
        self.telemetry.record(summary);
        info!("dialogue session {} finished after {} turns", self.session, self.turns);
        self.telemetry.snapshot()
    }

    /// Runs `first` and every event its effects produce until the queue drains.
    async fn run(&mut self, first: DialogueEvent) -> TurnOutput {
        let mut output = TurnOutput::default();
        let mut queue = VecDeque::from([first]);

        while let Some(event) = queue.pop_front() {
            let today = self.today();
            let ctx = TurnContext {
                snapshot: &self.snapshot,
                today,
                language: &self.language,
            };
            let step = transition(std::mem::take(&mut self.state), event, &ctx);
            self.state = step.state;

            for effect in step.effects {
                match effect {
                    SideEffect::Reply(text) => output.replies.push(text),
                    SideEffect::Navigate(page) => output.navigate = Some(page),
                    SideEffect::Log(line) => info!("[{}] {}", self.session, line),
                    SideEffect::Telemetry(event) => self.telemetry.record(event),
                    SideEffect::Classify { utterance, version } => {
                        let intent = self.classify(&utterance).await;
                        queue.push_back(DialogueEvent::Classified {
                            transcript: utterance,
                            intent,
                            version,
                        });
                    }
                    SideEffect::Commit(mutation) => {
                        let result = self.mutations.apply(&mutation).await;
                        queue.push_back(match result {
                            Ok(()) => DialogueEvent::CommitSucceeded,
                            Err(e) => DialogueEvent::CommitFailed(e.to_string()),
                        });
                    }
                }
            }
        }

        output
    }

    /// Never fails: an unreachable classifier becomes a transport-failure
    /// intent, unreadable output becomes `Unknown`.
    async fn classify(&self, utterance: &str) -> NormalizedIntent {
        match self.classifier.classify(utterance, &self.snapshot).await {
            Ok(raw) => {
                let intent = normalize(&raw, &self.snapshot);
                debug!("classified as {}", intent.kind.tag());
                intent
            }
            Err(e) if e.is_malformed() => {
                warn!("classifier output unusable: {}", e);
                NormalizedIntent::unknown(e.to_string())
            }
            Err(e) => {
                warn!("classifier call failed: {}", e);
                NormalizedIntent::transport_failure(e.to_string())
            }
        }
    }
}
