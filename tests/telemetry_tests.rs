use jarvis::assistant::intent::IntentKind;
use jarvis::domain::MutationKind;
use jarvis::kernel::state::{Phase, TaskSlot};
use jarvis::kernel::telemetry::{TelemetryEvent, TelemetryRecorder};

#[test]
fn test_snapshot_counts() {
    let mut recorder = TelemetryRecorder::new();
    recorder.record(TelemetryEvent::IntentClassified { kind: IntentKind::CreateTask });
    recorder.record(TelemetryEvent::IntentClassified { kind: IntentKind::CreateTask });
    recorder.record(TelemetryEvent::ClassifierFallback { transport: true });
    recorder.record(TelemetryEvent::SlotSkipped { slot: TaskSlot::Assignee });
    recorder.record(TelemetryEvent::SlotFilled { slot: TaskSlot::DueDate });
    recorder.record(TelemetryEvent::SlotReprompted { slot: TaskSlot::DueDate });
    recorder.record(TelemetryEvent::CommitRequested { kind: MutationKind::CreateTask });
    recorder.record(TelemetryEvent::CommitCompleted { kind: MutationKind::CreateTask, ok: false });
    recorder.record(TelemetryEvent::CommitCompleted { kind: MutationKind::CreateTask, ok: true });
    recorder.record(TelemetryEvent::Cancelled { from: Phase::AwaitingTaskNotes });

    let snap = recorder.snapshot();
    assert_eq!(snap.intent_stats.classified, 2);
    assert_eq!(snap.intent_stats.by_kind.get(&IntentKind::CreateTask), Some(&2));
    assert_eq!(snap.intent_stats.transport_failures, 1);
    assert_eq!(snap.slot_stats.skipped, 1);
    assert_eq!(snap.slot_stats.filled, 1);
    assert_eq!(snap.slot_stats.reprompts, 1);
    assert_eq!(snap.commit_stats.requested, 1);
    assert_eq!(snap.commit_stats.success_rate, 0.5);
    assert_eq!(snap.dialogue_stats.cancels, 1);

    match recorder.aggregate_session(4) {
        TelemetryEvent::SessionSummary { turns, commits, cancels } => {
            assert_eq!((turns, commits, cancels), (4, 1, 1));
        }
        other => panic!("Expected SessionSummary, got {:?}", other),
    }
}

#[test]
fn test_recorder_is_bounded() {
    let mut recorder = TelemetryRecorder::new();
    for _ in 0..10_050 {
        recorder.record(TelemetryEvent::SlotFilled { slot: TaskSlot::Notes });
    }
    assert_eq!(recorder.len(), 10_000, "Oldest events are evicted");

    recorder.clear();
    assert!(recorder.is_empty());
}

#[test]
fn test_events_carry_no_user_content() {
    let events = vec![
        TelemetryEvent::PhaseTransition { from: Phase::Idle, to: Phase::AwaitingTaskAssignee },
        TelemetryEvent::CorrectionApplied { from: Phase::AwaitingTaskDate },
        TelemetryEvent::StaleClassificationDropped { requested: 3, current: 5 },
    ];
    let json = serde_json::to_string(&events).unwrap();
    // Only enum tags and numbers: no free-form string values.
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    fn has_free_text(v: &serde_json::Value) -> bool {
        match v {
            serde_json::Value::String(s) => !s.chars().all(|c| c.is_ascii_alphanumeric()),
            serde_json::Value::Array(items) => items.iter().any(has_free_text),
            serde_json::Value::Object(map) => map.values().any(has_free_text),
            _ => false,
        }
    }
    assert!(!has_free_text(&value));
}
