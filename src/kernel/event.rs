use crate::assistant::handlers::Page;
use crate::assistant::intent::NormalizedIntent;
use crate::domain::Mutation;

use super::telemetry::event::TelemetryEvent;

/// Everything that can move the dialogue forward.
#[derive(Debug, Clone)]
pub enum DialogueEvent {
    /// A transcribed utterance.
    Utterance(String),
    /// Classifier answer for an utterance sent out at `version`.
    Classified {
        transcript: String,
        intent: NormalizedIntent,
        version: u64,
    },
    /// The confirm control.
    Confirm,
    /// The cancel control.
    Cancel,
    CommitSucceeded,
    CommitFailed(String),
    /// Microphone or transcription failed before there was any text.
    TransportFailed(String),
}

/// Work the transition asks the driver to perform. The transition itself
/// never does I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Text for the user.
    Reply(String),
    /// Send the utterance to the classifier and feed the answer back as
    /// [`DialogueEvent::Classified`] tagged with `version`.
    Classify { utterance: String, version: u64 },
    /// Hand a confirmed mutation to the planner API.
    Commit(Mutation),
    Navigate(Page),
    /// Diagnostic line for the tracing layer.
    Log(String),
    Telemetry(TelemetryEvent),
}
