use chrono::NaiveDate;
use jarvis::assistant::intent::{IntentEntities, IntentKind, NormalizedIntent};
use jarvis::assistant::Language;
use jarvis::domain::{CollaboratorRecord, DomainSnapshot, Mutation, ProjectRecord};
use jarvis::kernel::event::{DialogueEvent, SideEffect};
use jarvis::kernel::state::{DialogueState, PendingPayload, PendingTask, Phase, TaskSlot};
use jarvis::kernel::telemetry::TelemetryEvent;
use jarvis::kernel::transition::{transition, TurnContext, CANCELLED, NOTHING_HEARD, NOTHING_TO_CONFIRM};

const ALL_PHASES: [Phase; 10] = [
    Phase::Idle,
    Phase::AwaitingProjectName,
    Phase::AwaitingProjectConfirmation,
    Phase::AwaitingUpdateConfirmation,
    Phase::AwaitingCollaboratorConfirmation,
    Phase::AwaitingArchiveConfirmation,
    Phase::AwaitingTaskAssignee,
    Phase::AwaitingTaskDate,
    Phase::AwaitingTaskNotes,
    Phase::AwaitingTaskConfirmation,
];

struct Fixture {
    snapshot: DomainSnapshot,
    language: Language,
}

impl Fixture {
    fn new() -> Self {
        Self {
            snapshot: DomainSnapshot {
                projects: vec![ProjectRecord::new("1", "Kabinex")],
                ..Default::default()
            },
            language: Language::standard(),
        }
    }

    fn ctx(&self) -> TurnContext<'_> {
        TurnContext {
            snapshot: &self.snapshot,
            today: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            language: &self.language,
        }
    }
}

fn awaiting_slot(slot: TaskSlot) -> DialogueState {
    let mut task = PendingTask {
        title: "fix login bug".to_string(),
        project_id: "1".to_string(),
        project_name: "Kabinex".to_string(),
        ..Default::default()
    };
    if slot != TaskSlot::Assignee {
        task.skip(TaskSlot::Assignee);
    }
    task.refresh_missing();
    DialogueState {
        phase: slot.phase(),
        pending: Some(PendingPayload::Task(task)),
        ..Default::default()
    }
}

fn awaiting_project(name: &str) -> DialogueState {
    DialogueState {
        phase: Phase::AwaitingProjectConfirmation,
        pending: Some(PendingPayload::Project { name: name.to_string() }),
        ..Default::default()
    }
}

fn has_commit(effects: &[SideEffect]) -> bool {
    effects.iter().any(|e| matches!(e, SideEffect::Commit(_)))
}

#[test]
fn test_cancel_from_every_phase() {
    let f = Fixture::new();
    for phase in ALL_PHASES {
        let state = DialogueState {
            phase,
            pending: Some(PendingPayload::Task(PendingTask::default())),
            ..Default::default()
        };
        let step = transition(state, DialogueEvent::Cancel, &f.ctx());
        assert_eq!(step.state.phase, Phase::Idle, "Cancel from {:?}", phase);
        assert!(step.state.pending.is_none());
        assert_eq!(step.replies(), vec![CANCELLED]);

        let again = transition(step.state, DialogueEvent::Cancel, &f.ctx());
        assert_eq!(again.state.phase, Phase::Idle);
        assert_eq!(again.replies(), vec![CANCELLED]);
        assert!(!has_commit(&again.effects));
    }
}

#[test]
fn test_every_transition_bumps_version() {
    let f = Fixture::new();
    let step = transition(DialogueState::new(), DialogueEvent::Utterance("  ".to_string()), &f.ctx());
    assert_eq!(step.state.version, 1);
    assert_eq!(step.replies(), vec![NOTHING_HEARD]);

    let step = transition(step.state, DialogueEvent::Utterance("hello".to_string()), &f.ctx());
    assert_eq!(step.state.version, 2);
    assert!(step
        .effects
        .contains(&SideEffect::Classify { utterance: "hello".to_string(), version: 2 }));
}

#[test]
fn test_confirm_ignored_while_committing() {
    let f = Fixture::new();

    // 1. First confirm emits the commit
    let step = transition(awaiting_project("Kabinex"), DialogueEvent::Confirm, &f.ctx());
    assert!(has_commit(&step.effects));
    assert!(step.state.is_committing());
    assert_eq!(step.state.phase, Phase::AwaitingProjectConfirmation);

    // 2. Second confirm before the acknowledgement does nothing
    let step = transition(step.state, DialogueEvent::Confirm, &f.ctx());
    assert!(!has_commit(&step.effects), "Double confirm must not commit twice");
    assert!(step.replies().is_empty());

    // 3. Acknowledgement clears the flow
    let step = transition(step.state, DialogueEvent::CommitSucceeded, &f.ctx());
    assert_eq!(step.state.phase, Phase::Idle);
    assert!(step.state.in_flight.is_none());
    assert_eq!(step.replies(), vec!["Project \"Kabinex\" was created."]);
}

#[test]
fn test_confirm_without_anything_ready() {
    let f = Fixture::new();
    let step = transition(DialogueState::new(), DialogueEvent::Confirm, &f.ctx());
    assert_eq!(step.replies(), vec![NOTHING_TO_CONFIRM]);

    let slot = DialogueState {
        phase: Phase::AwaitingTaskAssignee,
        pending: Some(PendingPayload::Task(PendingTask::default())),
        ..Default::default()
    };
    let step = transition(slot, DialogueEvent::Confirm, &f.ctx());
    assert_eq!(step.state.phase, Phase::AwaitingTaskAssignee);
    assert!(step.replies()[0].starts_with("There's nothing ready to confirm yet."));

    // A confirmation phase whose payload belongs elsewhere is reset, not committed.
    let broken = DialogueState {
        phase: Phase::AwaitingArchiveConfirmation,
        pending: Some(PendingPayload::Project { name: "Kabinex".to_string() }),
        ..Default::default()
    };
    let step = transition(broken, DialogueEvent::Confirm, &f.ctx());
    assert!(!has_commit(&step.effects));
    assert_eq!(step.state.phase, Phase::Idle);
}

#[test]
fn test_stale_classification_dropped() {
    let f = Fixture::new();
    let state = DialogueState {
        version: 5,
        ..awaiting_project("Kabinex")
    };
    let intent = NormalizedIntent::new(IntentKind::NavigateFinance, IntentEntities::default());
    let step = transition(
        state,
        DialogueEvent::Classified { transcript: "open finance".to_string(), intent, version: 3 },
        &f.ctx(),
    );

    assert!(step.replies().is_empty());
    assert!(!step.effects.iter().any(|e| matches!(e, SideEffect::Navigate(_))));
    assert!(step.effects.contains(&SideEffect::Telemetry(TelemetryEvent::StaleClassificationDropped {
        requested: 3,
        current: 5,
    })));
    assert_eq!(step.state.phase, Phase::AwaitingProjectConfirmation);
    assert_eq!(step.state.version, 6);
}

#[test]
fn test_short_project_name_reprompts() {
    let f = Fixture::new();
    let state = DialogueState {
        phase: Phase::AwaitingProjectName,
        ..Default::default()
    };

    let step = transition(state, DialogueEvent::Utterance("K".to_string()), &f.ctx());
    assert_eq!(step.state.phase, Phase::AwaitingProjectName);
    assert!(step.state.pending.is_none());

    let step = transition(step.state, DialogueEvent::Utterance("Kabinex".to_string()), &f.ctx());
    assert_eq!(step.state.phase, Phase::AwaitingProjectConfirmation);
    assert_eq!(step.state.pending, Some(PendingPayload::Project { name: "Kabinex".to_string() }));
}

#[test]
fn test_commit_failure_keeps_payload() {
    let f = Fixture::new();
    let step = transition(awaiting_project("Kabinex"), DialogueEvent::Confirm, &f.ctx());
    let in_flight = step.state.in_flight.clone();
    assert!(matches!(in_flight, Some(Mutation::CreateProject(_))));

    let step = transition(step.state, DialogueEvent::CommitFailed("500".to_string()), &f.ctx());
    assert_eq!(step.state.phase, Phase::AwaitingProjectConfirmation);
    assert!(step.state.pending.is_some());
    assert!(!step.state.is_committing());
    assert!(step.replies()[0].contains("Press confirm to try again"));
}

#[test]
fn test_negated_assignee_answer_names_collaborator() {
    let mut f = Fixture::new();
    f.snapshot.collaborators = vec![
        CollaboratorRecord::new("10", "Ali Zarei"),
        CollaboratorRecord::new("11", "Sara Ahmadi"),
    ];

    let step = transition(
        awaiting_slot(TaskSlot::Assignee),
        DialogueEvent::Utterance("no, it's Sara".to_string()),
        &f.ctx(),
    );
    assert_eq!(step.state.phase, Phase::AwaitingTaskDate);
    let task = step.state.pending_task().unwrap();
    assert_eq!(task.assignee_id.as_deref(), Some("11"));
    assert_eq!(task.assignee_name.as_deref(), Some("Sara Ahmadi"));
    assert_eq!(task.title, "fix login bug", "The answer must not rename the task");
}

#[test]
fn test_negated_date_answer_with_date() {
    let f = Fixture::new();

    let step = transition(
        awaiting_slot(TaskSlot::DueDate),
        DialogueEvent::Utterance("no, tomorrow".to_string()),
        &f.ctx(),
    );
    assert_eq!(step.state.phase, Phase::AwaitingTaskNotes);
    let task = step.state.pending_task().unwrap();
    assert_eq!(task.due_date.as_deref(), Some("2025-02-11"));
    assert!(!task.skipped.contains(&TaskSlot::DueDate));

    let step = transition(
        awaiting_slot(TaskSlot::DueDate),
        DialogueEvent::Utterance("no".to_string()),
        &f.ctx(),
    );
    assert_eq!(step.state.phase, Phase::AwaitingTaskNotes);
    let task = step.state.pending_task().unwrap();
    assert_eq!(task.due_date, None);
    assert!(task.skipped.contains(&TaskSlot::DueDate));
}
