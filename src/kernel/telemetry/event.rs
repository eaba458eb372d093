use serde::{Deserialize, Serialize};

use crate::assistant::handlers::HandlerOutcome;
use crate::assistant::intent::IntentKind;
use crate::domain::MutationKind;
use crate::kernel::state::{Phase, TaskSlot};

// Allowed: phases, enums, versions, counts
// Forbidden: transcripts, entity names, task titles, audio

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    PhaseTransition {
        from: Phase,
        to: Phase,
    },

    IntentClassified {
        kind: IntentKind,
    },

    /// Classifier output replaced by `Unknown`. `transport` is true when the
    /// service was unreachable rather than incoherent.
    ClassifierFallback {
        transport: bool,
    },

    HandlerCompleted {
        kind: IntentKind,
        outcome: HandlerOutcome,
    },

    SlotFilled {
        slot: TaskSlot,
    },

    SlotSkipped {
        slot: TaskSlot,
    },

    /// The answer could not be used and the slot was asked again.
    SlotReprompted {
        slot: TaskSlot,
    },

    CorrectionApplied {
        from: Phase,
    },

    CommitRequested {
        kind: MutationKind,
    },

    CommitCompleted {
        kind: MutationKind,
        ok: bool,
    },

    Cancelled {
        from: Phase,
    },

    StaleClassificationDropped {
        requested: u64,
        current: u64,
    },

    SessionSummary {
        turns: u64,
        commits: u64,
        cancels: u64,
    },
}
