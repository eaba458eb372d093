use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use jarvis::assistant::handlers::Page;
use jarvis::assistant::intent::RawClassification;
use jarvis::domain::{CollaboratorRecord, DomainSnapshot, Mutation, ProjectRecord};
use jarvis::error::TransportError;
use jarvis::kernel::state::{PendingPayload, Phase, TaskSlot};
use jarvis::kernel::transition::{CANCELLED, TRANSPORT_RETRY, USE_CONTROLS};
use jarvis::kernel::DialogueController;
use jarvis::services::ports::{AudioClip, IntentClassifier, MutationApi, Transcriber};
use serde_json::json;

/// Answers classification requests from a script, in order.
#[derive(Default)]
struct ScriptedClassifier {
    answers: Mutex<VecDeque<Result<RawClassification, TransportError>>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    fn push(&self, value: serde_json::Value) {
        let raw = serde_json::from_value(value).unwrap();
        self.answers.lock().unwrap().push_back(Ok(raw));
    }

    fn push_err(&self, err: TransportError) {
        self.answers.lock().unwrap().push_back(Err(err));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(&self, _: &str, _: &DomainSnapshot) -> Result<RawClassification, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Malformed("no scripted answer".to_string())))
    }
}

/// Records every mutation; fails while `failing` is set.
#[derive(Default)]
struct RecordingApi {
    applied: Mutex<Vec<Mutation>>,
    failing: AtomicBool,
}

impl RecordingApi {
    fn applied(&self) -> Vec<Mutation> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl MutationApi for RecordingApi {
    async fn apply(&self, mutation: &Mutation) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Status { status: 500, body: "boom".to_string() });
        }
        self.applied.lock().unwrap().push(mutation.clone());
        Ok(())
    }
}

struct SilentTranscriber;

#[async_trait]
impl Transcriber for SilentTranscriber {
    async fn transcribe(&self, _: &AudioClip) -> Result<String, TransportError> {
        Err(TransportError::EmptyTranscript)
    }
}

struct Harness {
    controller: DialogueController,
    classifier: Arc<ScriptedClassifier>,
    api: Arc<RecordingApi>,
}

fn harness() -> Harness {
    let classifier = Arc::new(ScriptedClassifier::default());
    let api = Arc::new(RecordingApi::default());
    let mut controller = DialogueController::new(classifier.clone(), api.clone())
        .with_today(NaiveDate::from_ymd_opt(2025, 2, 10).unwrap());
    controller.set_snapshot(DomainSnapshot {
        projects: vec![ProjectRecord::new("1", "Kabinex"), ProjectRecord::new("2", "Old Shop").archived()],
        collaborators: vec![
            CollaboratorRecord::new("10", "Ali Zarei"),
            CollaboratorRecord::new("11", "Sara Ahmadi"),
        ],
        tasks: vec![],
    });
    Harness { controller, classifier, api }
}

fn kabinex_task() -> serde_json::Value {
    json!({
        "intent": "create_task",
        "taskInfo": { "title": "fix login bug", "projectName": "Kabinex" }
    })
}

#[tokio::test]
async fn test_create_project_commits_once() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "create_project", "projectName": "Kabinex" }));

    // 1. Utterance -> confirmation prompt
    let out = h.controller.handle_transcript("create a project called Kabinex").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingProjectConfirmation);
    assert!(out.text().contains("Kabinex"));
    assert!(h.api.applied().is_empty(), "Nothing is committed before confirm");

    // 2. Confirm -> exactly one createProject
    let out = h.controller.confirm().await;
    let applied = h.api.applied();
    assert_eq!(applied.len(), 1);
    match &applied[0] {
        Mutation::CreateProject(project) => {
            assert_eq!(project.name, "Kabinex");
            assert_eq!(project.start_date, "2025-02-10");
            assert_eq!(project.status, "active");
        }
        other => panic!("Expected CreateProject, got {:?}", other),
    }
    assert_eq!(out.replies, vec!["Project \"Kabinex\" was created.".to_string()]);
    assert_eq!(h.controller.state().phase, Phase::Idle);
    assert!(h.controller.state().pending.is_none());
}

#[tokio::test]
async fn test_project_name_asked_separately() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "create_project", "needsProjectName": true, "missingFields": ["projectName"] }));

    h.controller.handle_transcript("make a new project").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingProjectName);

    // The name is taken verbatim, the classifier is not consulted.
    h.controller.handle_transcript("Kabinex Mobile").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingProjectConfirmation);
    assert_eq!(h.classifier.calls(), 1);

    h.controller.confirm().await;
    assert!(matches!(&h.api.applied()[..], [Mutation::CreateProject(p)] if p.name == "Kabinex Mobile"));
}

#[tokio::test]
async fn test_declined_assignee_moves_to_date() {
    let mut h = harness();
    h.classifier.push(kabinex_task());

    h.controller.handle_transcript("add task fix login bug to Kabinex").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingTaskAssignee);

    h.controller.handle_transcript("no").await;
    let state = h.controller.state();
    assert_eq!(state.phase, Phase::AwaitingTaskDate);
    let task = state.pending_task().unwrap();
    assert_eq!(task.assignee_id, None);
    assert_eq!(task.skipped, vec![TaskSlot::Assignee]);
}

#[tokio::test]
async fn test_unreadable_date_asks_again() {
    let mut h = harness();
    h.classifier.push(kabinex_task());

    h.controller.handle_transcript("add task fix login bug to Kabinex").await;
    h.controller.handle_transcript("no").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingTaskDate);

    let out = h.controller.handle_transcript("sometime soon").await;
    let state = h.controller.state();
    assert_eq!(state.phase, Phase::AwaitingTaskDate);
    assert_eq!(state.pending_task().unwrap().due_date, None);
    assert_eq!(out.replies, vec![TaskSlot::DueDate.reprompt().to_string()]);
    assert_eq!(h.classifier.calls(), 1);
}

#[tokio::test]
async fn test_negated_assignee_answer_is_not_a_rename() {
    let mut h = harness();
    h.classifier.push(kabinex_task());

    h.controller.handle_transcript("add task fix login bug to Kabinex").await;
    h.controller.handle_transcript("no, it's Sara").await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::AwaitingTaskDate);
    let task = state.pending_task().unwrap();
    assert_eq!(task.assignee_id.as_deref(), Some("11"));
    assert_eq!(task.title, "fix login bug");
}

#[tokio::test]
async fn test_slots_filled_in_order_then_committed() {
    let mut h = harness();
    h.classifier.push(kabinex_task());

    h.controller.handle_transcript("add task fix login bug to Kabinex").await;

    // Unknown collaborator: asked again.
    let out = h.controller.handle_transcript("Bob").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingTaskAssignee);
    assert!(out.text().contains("couldn't find that collaborator"));

    h.controller.handle_transcript("Sara").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingTaskDate);

    h.controller.handle_transcript("tomorrow").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingTaskNotes);

    h.controller.handle_transcript("check the safari build first").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingTaskConfirmation);
    assert_eq!(h.classifier.calls(), 1, "Slot answers never go to the classifier");

    h.controller.confirm().await;
    let applied = h.api.applied();
    let [Mutation::CreateTask { task, project_name }] = &applied[..] else {
        panic!("Expected one CreateTask, got {:?}", applied);
    };
    assert_eq!(project_name, "Kabinex");
    assert_eq!(task.project_id, "1");
    assert_eq!(task.title, "fix login bug");
    assert_eq!(task.assignee_id.as_deref(), Some("11"));
    assert_eq!(task.due_at.as_deref(), Some("2025-02-11T00:00:00Z"));
    assert_eq!(task.notes.as_deref(), Some("check the safari build first"));
    assert_eq!(task.priority, 3);
    assert_eq!(task.status, "todo");
    assert_eq!(h.controller.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_title_correction_jumps_to_confirmation() {
    let mut h = harness();
    h.classifier.push(kabinex_task());

    h.controller.handle_transcript("add task fix login bug to Kabinex").await;
    let out = h.controller.handle_transcript("change the title to fix signup bug").await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::AwaitingTaskConfirmation);
    assert_eq!(state.pending_task().unwrap().title, "fix signup bug");
    assert!(out.text().contains("fix signup bug"));

    h.controller.confirm().await;
    let applied = h.api.applied();
    let [Mutation::CreateTask { task, .. }] = &applied[..] else {
        panic!("Expected one CreateTask");
    };
    assert_eq!(task.title, "fix signup bug");
    assert_eq!(task.due_at, None);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let mut h = harness();
    h.classifier.push(kabinex_task());
    h.controller.handle_transcript("add task fix login bug to Kabinex").await;

    for _ in 0..3 {
        let out = h.controller.cancel().await;
        assert_eq!(out.replies, vec![CANCELLED.to_string()]);
        assert_eq!(h.controller.state().phase, Phase::Idle);
        assert!(h.controller.state().pending.is_none());
    }
    assert!(h.api.applied().is_empty());
    assert_eq!(h.controller.telemetry().dialogue_stats.cancels, 1, "Only a real flow counts as cancelled");
}

#[tokio::test]
async fn test_transport_failure_keeps_state() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "archive_project", "projectName": "Kabinex" }));
    h.controller.handle_transcript("archive kabinex").await;
    assert_eq!(h.controller.state().phase, Phase::AwaitingArchiveConfirmation);
    let before = h.controller.state().pending.clone();

    // Transcription failure
    let out = h.controller.handle_audio(&SilentTranscriber, &AudioClip::wav(vec![0; 44])).await;
    assert_eq!(out.replies, vec![TRANSPORT_RETRY.to_string()]);
    assert_eq!(h.controller.state().phase, Phase::AwaitingArchiveConfirmation);
    assert_eq!(h.controller.state().pending, before);

    // Classifier unreachable
    h.classifier.push_err(TransportError::Status { status: 503, body: String::new() });
    let out = h.controller.handle_transcript("actually open the projects page").await;
    assert_eq!(out.replies, vec![TRANSPORT_RETRY.to_string()]);
    assert_eq!(h.controller.state().phase, Phase::AwaitingArchiveConfirmation);
    assert_eq!(h.controller.state().pending, before);

    h.controller.confirm().await;
    assert!(matches!(&h.api.applied()[..], [Mutation::ArchiveProject { project_id, .. }] if project_id == "1"));
}

#[tokio::test]
async fn test_malformed_output_is_unknown_not_retry() {
    let mut h = harness();
    h.classifier.push_err(TransportError::Malformed("no JSON object in model output".to_string()));

    let out = h.controller.handle_transcript("blah").await;
    assert!(out.text().starts_with("Sorry, I didn't understand that."));
    assert_eq!(h.controller.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_bare_yes_needs_the_control() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "create_project", "projectName": "Kabinex" }));
    h.controller.handle_transcript("create a project called Kabinex").await;

    let out = h.controller.handle_transcript("yes").await;
    assert_eq!(out.replies, vec![USE_CONTROLS.to_string()]);
    assert_eq!(h.classifier.calls(), 1);
    assert!(h.api.applied().is_empty(), "Only the confirm control commits");
}

#[tokio::test]
async fn test_navigation_keeps_pending_flow() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "archive_project", "projectName": "Kabinex" }));
    h.classifier.push(json!({ "intent": "navigate_finance" }));

    h.controller.handle_transcript("archive kabinex").await;
    let out = h.controller.handle_transcript("open the finance page").await;

    assert_eq!(out.navigate, Some(Page::Finance));
    assert_eq!(h.controller.state().phase, Phase::AwaitingArchiveConfirmation);
    assert!(matches!(h.controller.state().pending, Some(PendingPayload::Archive { .. })));
}

#[tokio::test]
async fn test_failed_commit_can_be_retried() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "create_project", "projectName": "Kabinex" }));
    h.controller.handle_transcript("create a project called Kabinex").await;

    h.api.failing.store(true, Ordering::SeqCst);
    let out = h.controller.confirm().await;
    assert!(out.text().starts_with("Saving failed."));
    assert_eq!(h.controller.state().phase, Phase::AwaitingProjectConfirmation);
    assert!(!h.controller.state().is_committing());

    h.api.failing.store(false, Ordering::SeqCst);
    h.controller.confirm().await;
    assert_eq!(h.api.applied().len(), 1);
    assert_eq!(h.controller.state().phase, Phase::Idle);

    let stats = h.controller.telemetry().commit_stats;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
}

#[tokio::test]
async fn test_restore_commits_immediately() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "restore_project", "projectName": "old shop" }));

    let out = h.controller.handle_transcript("bring back old shop").await;
    assert_eq!(h.api.applied().len(), 1);
    assert!(out.text().contains("is active again"));
    assert_eq!(h.controller.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_session_summary() {
    let mut h = harness();
    h.classifier.push(json!({ "intent": "small_talk" }));
    h.controller.handle_transcript("hi there").await;
    h.controller.cancel().await;

    let summary = h.controller.finish();
    assert_eq!(summary.intent_stats.classified, 1);
    assert_eq!(summary.commit_stats.requested, 0);
}
