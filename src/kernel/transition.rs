//! The dialogue state machine.
//!
//! `transition(state, event, ctx) -> Step` is pure: it reads the snapshot,
//! the reference date and the rule tables from `ctx` and returns the next
//! state plus the side effects the driver must run. Classification and
//! commits come back in as new events.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::event::{DialogueEvent, SideEffect};
use super::state::{DialogueState, PendingPayload, PendingTask, Phase, TaskSlot};
use super::telemetry::TelemetryEvent;
use crate::assistant::handlers::{dispatch, HandlerInput, HandlerResult, ImmediateAction};
use crate::assistant::intent::{IntentKind, NormalizedIntent};
use crate::assistant::resolver::{find_in_text, resolve};
use crate::assistant::Language;
use crate::domain::{DomainSnapshot, Mutation};

pub const MIN_PROJECT_NAME_CHARS: usize = 2;

pub const CANCELLED: &str = "Okay, nothing was changed.";
pub const NOTHING_HEARD: &str = "I didn't catch anything. Please try again.";
pub const NOTHING_TO_CONFIRM: &str = "Nothing to confirm.";
pub const TRANSPORT_RETRY: &str = "I couldn't reach the assistant service. Please try again.";
pub const USE_CONTROLS: &str = "Use the confirm button to go ahead, or cancel to drop it.";

/// Read-only inputs for one transition.
pub struct TurnContext<'a> {
    pub snapshot: &'a DomainSnapshot,
    pub today: NaiveDate,
    pub language: &'a Language,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub state: DialogueState,
    pub effects: Vec<SideEffect>,
}

impl Step {
    /// All `Reply` texts, in order.
    pub fn replies(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::Reply(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

struct Turn<'c, 'a> {
    state: DialogueState,
    effects: Vec<SideEffect>,
    ctx: &'c TurnContext<'a>,
}

impl Turn<'_, '_> {
    fn reply(&mut self, text: impl Into<String>) {
        self.effects.push(SideEffect::Reply(text.into()));
    }

    fn log(&mut self, text: impl Into<String>) {
        self.effects.push(SideEffect::Log(text.into()));
    }

    fn telemetry(&mut self, event: TelemetryEvent) {
        self.effects.push(SideEffect::Telemetry(event));
    }

    fn classify(&mut self, utterance: &str) {
        let version = self.state.version;
        self.effects.push(SideEffect::Classify {
            utterance: utterance.to_string(),
            version,
        });
    }

    /// Invariant break: drop whatever was staged and start over.
    fn abort(&mut self, why: &str, reply: &str) {
        warn!("dialogue reset: {}", why);
        self.log(format!("dialogue reset: {}", why));
        self.state.reset();
        self.reply(reply);
    }
}

pub fn transition(state: DialogueState, event: DialogueEvent, ctx: &TurnContext<'_>) -> Step {
    let from = state.phase;
    let requested_at = state.version;
    let mut turn = Turn {
        state,
        effects: Vec::new(),
        ctx,
    };
    turn.state.version += 1;

    match event {
        DialogueEvent::Utterance(text) => on_utterance(&mut turn, &text),
        DialogueEvent::Classified {
            transcript,
            intent,
            version,
        } => {
            if version == requested_at {
                on_classified(&mut turn, &transcript, intent);
            } else {
                debug!("discarded stale classification: requested at {} vs state {}", version, requested_at);
                turn.telemetry(TelemetryEvent::StaleClassificationDropped {
                    requested: version,
                    current: requested_at,
                });
            }
        }
        DialogueEvent::Confirm => on_confirm(&mut turn),
        DialogueEvent::Cancel => on_cancel(&mut turn),
        DialogueEvent::CommitSucceeded => on_commit_succeeded(&mut turn),
        DialogueEvent::CommitFailed(reason) => on_commit_failed(&mut turn, &reason),
        DialogueEvent::TransportFailed(reason) => {
            warn!("transport failure: {}", reason);
            turn.reply(TRANSPORT_RETRY);
        }
    }

    if turn.state.phase != from {
        turn.telemetry(TelemetryEvent::PhaseTransition {
            from,
            to: turn.state.phase,
        });
    }

    Step {
        state: turn.state,
        effects: turn.effects,
    }
}

fn on_utterance(turn: &mut Turn<'_, '_>, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        turn.reply(NOTHING_HEARD);
        return;
    }

    let phase = turn.state.phase;
    match phase {
        Phase::AwaitingProjectName => on_project_name(turn, text),
        _ if phase.is_task_slot() => on_slot_answer(turn, text),
        Phase::AwaitingTaskConfirmation => {
            if !apply_correction(turn, text) {
                on_confirmation_utterance(turn, text);
            }
        }
        _ if phase.is_confirmation() => on_confirmation_utterance(turn, text),
        _ => turn.classify(text),
    }
}

fn on_project_name(turn: &mut Turn<'_, '_>, text: &str) {
    if text.chars().count() < MIN_PROJECT_NAME_CHARS {
        turn.reply("That name is too short. What should the project be called?");
        return;
    }
    turn.state.pending = Some(PendingPayload::Project {
        name: text.to_string(),
    });
    turn.state.phase = Phase::AwaitingProjectConfirmation;
    turn.reply(format!("Create project \"{}\"?", text));
}

/// A bare "yes" or "no" is not a command while a confirmation is pending;
/// only the controls resolve it. Anything longer is a new request.
fn on_confirmation_utterance(turn: &mut Turn<'_, '_>, text: &str) {
    let lexicon = &turn.ctx.language.lexicon;
    if lexicon.is_affirmation(text) || lexicon.is_negation(text) {
        turn.reply(USE_CONTROLS);
    } else {
        turn.classify(text);
    }
}

/// Rewrites the pending task title when the utterance is a title correction,
/// and jumps straight to confirmation. Returns false when it is not one.
fn apply_correction(turn: &mut Turn<'_, '_>, text: &str) -> bool {
    let Some(title) = turn.ctx.language.corrections.detect(text) else {
        return false;
    };
    let Some(PendingPayload::Task(task)) = turn.state.pending.as_mut() else {
        return false;
    };
    task.title = title;
    let message = format!(
        "Got it, the task title is now \"{}\".\n\nAdd this task?\n\n{}",
        task.title,
        task.summary()
    );
    let from = turn.state.phase;
    turn.state.phase = Phase::AwaitingTaskConfirmation;
    turn.telemetry(TelemetryEvent::CorrectionApplied { from });
    turn.reply(message);
    true
}

enum SlotAnswer {
    Filled,
    Skipped,
    Unusable,
}

fn fill_slot(task: &mut PendingTask, slot: TaskSlot, text: &str, ctx: &TurnContext<'_>) -> SlotAnswer {
    let lexicon = &ctx.language.lexicon;
    match slot {
        TaskSlot::Assignee => {
            let collaborators = &ctx.snapshot.collaborators;
            // A collaborator named in the answer wins over a negation word ("no, Ali").
            let found = match find_in_text(text, collaborators) {
                Some(found) => Some(found),
                None if lexicon.is_negation(text) => return SlotAnswer::Skipped,
                None => resolve(text, collaborators),
            };
            match found {
                Some(c) => {
                    task.assignee_id = Some(c.id.clone());
                    task.assignee_name = Some(c.name.clone());
                    SlotAnswer::Filled
                }
                None => SlotAnswer::Unusable,
            }
        }
        TaskSlot::DueDate => match ctx.language.dates.parse(text, ctx.today) {
            // A date in the answer wins over a negation word ("no, tomorrow").
            Some(date) => {
                task.due_date = Some(date);
                SlotAnswer::Filled
            }
            None if lexicon.is_negation(text) => SlotAnswer::Skipped,
            None => SlotAnswer::Unusable,
        },
        TaskSlot::Notes => {
            if lexicon.is_negation(text) {
                return SlotAnswer::Skipped;
            }
            task.notes = Some(text.to_string());
            SlotAnswer::Filled
        }
    }
}

fn on_slot_answer(turn: &mut Turn<'_, '_>, text: &str) {
    let Some(slot) = turn.state.phase.slot() else {
        return;
    };
    if turn.state.pending_task().is_none() {
        turn.abort("task slot phase without a pending task", "Something went wrong, let's start over.");
        return;
    }
    if apply_correction(turn, text) {
        return;
    }

    let Some(PendingPayload::Task(mut task)) = turn.state.pending.take() else {
        return;
    };
    match fill_slot(&mut task, slot, text, turn.ctx) {
        SlotAnswer::Filled => turn.telemetry(TelemetryEvent::SlotFilled { slot }),
        SlotAnswer::Skipped => {
            task.skip(slot);
            turn.telemetry(TelemetryEvent::SlotSkipped { slot });
        }
        SlotAnswer::Unusable => {
            turn.state.pending = Some(PendingPayload::Task(task));
            turn.telemetry(TelemetryEvent::SlotReprompted { slot });
            turn.reply(slot.reprompt());
            return;
        }
    }

    task.refresh_missing();
    match task.next_missing() {
        Some(next) => {
            turn.state.phase = next.phase();
            turn.reply(next.prompt());
        }
        None => {
            turn.state.phase = Phase::AwaitingTaskConfirmation;
            turn.reply(format!("Add this task?\n\n{}", task.summary()));
        }
    }
    turn.state.pending = Some(PendingPayload::Task(task));
}

/// Intents that start or replace a dialogue flow. The rest (navigation,
/// small talk, unknown) leave a pending flow alone.
fn starts_flow(kind: IntentKind) -> bool {
    !matches!(
        kind,
        IntentKind::NavigateToday
            | IntentKind::NavigateProjects
            | IntentKind::NavigateFinance
            | IntentKind::SmallTalk
            | IntentKind::Unknown
    )
}

fn on_classified(turn: &mut Turn<'_, '_>, transcript: &str, intent: NormalizedIntent) {
    if intent.transport_failure {
        warn!(
            "classifier unreachable: {}",
            intent.reason.as_deref().unwrap_or("no reason given")
        );
        turn.telemetry(TelemetryEvent::ClassifierFallback { transport: true });
        turn.reply(TRANSPORT_RETRY);
        return;
    }

    let kind = intent.kind;
    if kind == IntentKind::Unknown && intent.reason.is_some() {
        turn.telemetry(TelemetryEvent::ClassifierFallback { transport: false });
    }
    turn.telemetry(TelemetryEvent::IntentClassified { kind });

    let input = HandlerInput {
        snapshot: turn.ctx.snapshot,
        transcript,
        today: turn.ctx.today,
        language: turn.ctx.language,
    };
    let result = dispatch(&intent, &input);
    turn.telemetry(TelemetryEvent::HandlerCompleted {
        kind,
        outcome: result.outcome(),
    });
    turn.log(format!("{} -> {:?}", kind.tag(), result.outcome()));

    match result {
        HandlerResult::Error(message) => {
            if starts_flow(kind) {
                turn.state.reset();
            }
            turn.reply(message);
        }
        HandlerResult::NeedsMoreInput {
            message,
            next_phase,
            payload,
        } => {
            turn.state.phase = next_phase;
            turn.state.pending = payload;
            turn.reply(message);
        }
        HandlerResult::NeedsConfirmation { message, payload } => {
            turn.state.phase = payload.confirmation_phase();
            turn.state.pending = Some(payload);
            turn.reply(message);
        }
        HandlerResult::Success { message, action } => {
            if starts_flow(kind) {
                turn.state.reset();
            }
            turn.reply(message);
            match action {
                Some(ImmediateAction::Commit(mutation)) => begin_commit(turn, mutation),
                Some(ImmediateAction::Navigate(page)) => turn.effects.push(SideEffect::Navigate(page)),
                None => {}
            }
        }
    }
}

fn begin_commit(turn: &mut Turn<'_, '_>, mutation: Mutation) {
    if turn.state.is_committing() {
        turn.reply("Still saving the previous change. Please wait a moment.");
        return;
    }
    turn.telemetry(TelemetryEvent::CommitRequested {
        kind: mutation.kind(),
    });
    turn.state.in_flight = Some(mutation.clone());
    turn.effects.push(SideEffect::Commit(mutation));
}

fn on_confirm(turn: &mut Turn<'_, '_>) {
    if turn.state.is_committing() {
        turn.log("confirm ignored: commit already in flight");
        return;
    }

    let phase = turn.state.phase;
    if phase.is_confirmation() {
        match turn.state.pending.clone() {
            Some(payload) if payload.confirmation_phase() == phase => {
                let mutation = payload.into_mutation(turn.ctx.today);
                begin_commit(turn, mutation);
            }
            Some(_) => turn.abort("pending payload does not match the confirmation phase", NOTHING_TO_CONFIRM),
            None => turn.abort("confirm with no pending payload", NOTHING_TO_CONFIRM),
        }
        return;
    }

    let has_pending = turn.state.pending.is_some();
    match (phase, has_pending) {
        (Phase::Idle, false) => turn.reply(NOTHING_TO_CONFIRM),
        (Phase::Idle, true) => turn.abort("idle dialogue carried a pending payload", NOTHING_TO_CONFIRM),
        _ => {
            let prompt = match phase.slot() {
                Some(slot) => slot.prompt(),
                None => "What should the project be called?",
            };
            turn.reply(format!("There's nothing ready to confirm yet. {}", prompt));
        }
    }
}

fn on_cancel(turn: &mut Turn<'_, '_>) {
    let from = turn.state.phase;
    if from != Phase::Idle || turn.state.pending.is_some() {
        turn.telemetry(TelemetryEvent::Cancelled { from });
    }
    turn.state.reset();
    turn.reply(CANCELLED);
}

fn on_commit_succeeded(turn: &mut Turn<'_, '_>) {
    let Some(mutation) = turn.state.in_flight.take() else {
        turn.log("commit acknowledgement with nothing in flight");
        return;
    };
    turn.telemetry(TelemetryEvent::CommitCompleted {
        kind: mutation.kind(),
        ok: true,
    });
    if turn.state.phase.is_confirmation() {
        turn.state.reset();
    }
    turn.reply(mutation.success_message());
}

/// The staged payload survives so the user can press confirm again.
fn on_commit_failed(turn: &mut Turn<'_, '_>, reason: &str) {
    let Some(mutation) = turn.state.in_flight.take() else {
        turn.log("commit failure with nothing in flight");
        return;
    };
    warn!("commit {:?} failed: {}", mutation.kind(), reason);
    turn.telemetry(TelemetryEvent::CommitCompleted {
        kind: mutation.kind(),
        ok: false,
    });
    let retry = if turn.state.phase.is_confirmation() {
        " Press confirm to try again, or cancel."
    } else {
        " Please try again."
    };
    turn.reply(format!("Saving failed.{}", retry));
}
