use std::collections::{HashMap, VecDeque};

use super::event::TelemetryEvent;
use crate::assistant::handlers::HandlerOutcome;
use crate::assistant::intent::IntentKind;

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub dialogue_stats: DialogueStats,
    pub intent_stats: IntentStats,
    pub slot_stats: SlotStats,
    pub commit_stats: CommitStats,
}

#[derive(Debug, Clone, Default)]
pub struct DialogueStats {
    pub transitions: u64,
    pub cancels: u64,
    pub corrections: u64,
    pub stale_dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub struct IntentStats {
    pub classified: u64,
    pub by_kind: HashMap<IntentKind, u64>,
    pub fallbacks: u64,
    pub transport_failures: u64,
    pub handler_errors: u64,
    pub needs_more_input: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SlotStats {
    pub filled: u64,
    pub skipped: u64,
    pub reprompts: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CommitStats {
    pub requested: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub success_rate: f64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::PhaseTransition { .. } => snap.dialogue_stats.transitions += 1,
            TelemetryEvent::Cancelled { .. } => snap.dialogue_stats.cancels += 1,
            TelemetryEvent::CorrectionApplied { .. } => snap.dialogue_stats.corrections += 1,
            TelemetryEvent::StaleClassificationDropped { .. } => snap.dialogue_stats.stale_dropped += 1,
            TelemetryEvent::IntentClassified { kind } => {
                snap.intent_stats.classified += 1;
                *snap.intent_stats.by_kind.entry(*kind).or_insert(0) += 1;
            }
            TelemetryEvent::ClassifierFallback { transport } => {
                snap.intent_stats.fallbacks += 1;
                if *transport {
                    snap.intent_stats.transport_failures += 1;
                }
            }
            TelemetryEvent::HandlerCompleted { outcome, .. } => match outcome {
                HandlerOutcome::Error => snap.intent_stats.handler_errors += 1,
                HandlerOutcome::NeedsMoreInput => snap.intent_stats.needs_more_input += 1,
                _ => {}
            },
            TelemetryEvent::SlotFilled { .. } => snap.slot_stats.filled += 1,
            TelemetryEvent::SlotSkipped { .. } => snap.slot_stats.skipped += 1,
            TelemetryEvent::SlotReprompted { .. } => snap.slot_stats.reprompts += 1,
            TelemetryEvent::CommitRequested { .. } => snap.commit_stats.requested += 1,
            TelemetryEvent::CommitCompleted { ok, .. } => {
                if *ok {
                    snap.commit_stats.succeeded += 1;
                } else {
                    snap.commit_stats.failed += 1;
                }
            }
            TelemetryEvent::SessionSummary { .. } => {}
        }
    }

    let completed = snap.commit_stats.succeeded + snap.commit_stats.failed;
    if completed > 0 {
        snap.commit_stats.success_rate = snap.commit_stats.succeeded as f64 / completed as f64;
    }

    snap
}
