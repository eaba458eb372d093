//! One pure function per intent: `(snapshot, entities) -> HandlerResult`.
//!
//! Handlers never mutate anything. They resolve references against the
//! snapshot and tell the dialogue what to do next; the only mutations they
//! describe are the ones for intents that skip confirmation (restore and
//! toggle), returned as [`ImmediateAction::Commit`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::format_iso;
use super::intent::{EntityRef, IntentEntities, IntentKind, NormalizedIntent};
use super::resolver::{find_in_text, resolve, resolve_ref};
use super::Language;
use crate::domain::{CollaboratorRecord, CollaboratorSnapshot, DomainSnapshot, Mutation, ProjectRecord};
use crate::kernel::state::{FieldChange, PendingPayload, PendingTask, Phase};

/// Pages of the planner UI the assistant can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
    Today,
    Projects,
    Finance,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Today => "/today",
            Page::Projects => "/projects",
            Page::Finance => "/finance",
        }
    }
}

/// Work a handler wants done right away, without a confirmation phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImmediateAction {
    Commit(Mutation),
    Navigate(Page),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    /// Unresolvable reference or failed precondition. The dialogue goes back to idle.
    Error(String),
    /// A required field is missing; ask for it in `next_phase`.
    NeedsMoreInput {
        message: String,
        next_phase: Phase,
        payload: Option<PendingPayload>,
    },
    /// Everything is known; wait for the confirm control.
    NeedsConfirmation {
        message: String,
        payload: PendingPayload,
    },
    Success {
        message: String,
        action: Option<ImmediateAction>,
    },
}

impl HandlerResult {
    /// Short label for logs and telemetry.
    pub fn outcome(&self) -> HandlerOutcome {
        match self {
            HandlerResult::Error(_) => HandlerOutcome::Error,
            HandlerResult::NeedsMoreInput { .. } => HandlerOutcome::NeedsMoreInput,
            HandlerResult::NeedsConfirmation { .. } => HandlerOutcome::NeedsConfirmation,
            HandlerResult::Success { .. } => HandlerOutcome::Success,
        }
    }

    fn reply(message: impl Into<String>) -> Self {
        HandlerResult::Success {
            message: message.into(),
            action: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerOutcome {
    Error,
    NeedsMoreInput,
    NeedsConfirmation,
    Success,
}

/// Everything a handler may look at.
pub struct HandlerInput<'a> {
    pub snapshot: &'a DomainSnapshot,
    pub transcript: &'a str,
    pub today: NaiveDate,
    pub language: &'a Language,
}

pub fn dispatch(intent: &NormalizedIntent, input: &HandlerInput<'_>) -> HandlerResult {
    let entities = &intent.entities;
    match intent.kind {
        IntentKind::CreateProject => create_project(entities),
        IntentKind::UpdateProjectClientInfo => update_project_client_info(entities, input),
        IntentKind::AddCollaboratorToProject => add_collaborator(entities, input),
        IntentKind::ArchiveProject => archive_project(entities, input),
        IntentKind::RestoreProject => restore_project(entities, input),
        IntentKind::CreateTask => create_task(entities, input),
        IntentKind::UpdateTask => update_task(),
        IntentKind::ToggleTaskDone => toggle_task_done(entities, input),
        IntentKind::NavigateToday => navigate(Page::Today),
        IntentKind::NavigateProjects => navigate(Page::Projects),
        IntentKind::NavigateFinance => navigate(Page::Finance),
        IntentKind::SmallTalk => HandlerResult::reply(
            "I can create projects and tasks, update client details, add collaborators, and archive or restore projects.",
        ),
        IntentKind::Unknown => {
            let mut message = "Sorry, I didn't understand that.".to_string();
            if let Some(reason) = &intent.reason {
                message.push_str(&format!(" ({})", reason));
            }
            HandlerResult::reply(message)
        }
    }
}

fn label(entity: &EntityRef) -> &str {
    entity.name.as_deref().unwrap_or("that project")
}

fn project_not_found(entity: &EntityRef) -> HandlerResult {
    HandlerResult::Error(format!(
        "I couldn't find project \"{}\". Please say the project name more clearly.",
        label(entity)
    ))
}

pub fn create_project(entities: &IntentEntities) -> HandlerResult {
    let asks_for_name = entities.needs_project_name
        || entities.missing_fields.iter().any(|f| f == "projectName");
    match &entities.project.name {
        Some(name) if !asks_for_name => HandlerResult::NeedsConfirmation {
            message: format!("Create project \"{}\"?", name),
            payload: PendingPayload::Project { name: name.clone() },
        },
        _ => HandlerResult::NeedsMoreInput {
            message: "You want to create a new project. What should it be called?".to_string(),
            next_phase: Phase::AwaitingProjectName,
            payload: None,
        },
    }
}

/// Id lookups search every project; name lookups prefer active ones.
fn find_project_for_update<'a>(entity: &EntityRef, snapshot: &'a DomainSnapshot) -> Option<&'a ProjectRecord> {
    if let Some(found) = entity.id.as_deref().and_then(|id| snapshot.project(id)) {
        return Some(found);
    }
    let name = entity.name.as_deref()?;
    resolve(name, snapshot.active_projects()).or_else(|| resolve(name, &snapshot.projects))
}

fn field_change(field: &str, old: &str, new: &Option<String>) -> Option<FieldChange> {
    let new = new.as_ref()?;
    let old = old.trim();
    // Clearing a field that is already empty changes nothing.
    if new.is_empty() && old.is_empty() {
        return None;
    }
    Some(FieldChange {
        field: field.to_string(),
        old: (!old.is_empty()).then(|| old.to_string()),
        new: new.clone(),
    })
}

pub fn update_project_client_info(entities: &IntentEntities, input: &HandlerInput<'_>) -> HandlerResult {
    let Some(project) = find_project_for_update(&entities.project, input.snapshot) else {
        return project_not_found(&entities.project);
    };

    let fields = &entities.update_fields;
    let changes: Vec<FieldChange> = [
        field_change("client name", &project.client_name, &fields.client_name),
        field_change("client phone", &project.client_phone, &fields.client_phone),
        field_change("referred by", &project.referred_by_name, &fields.referred_by_name),
        field_change("referrer phone", &project.referred_by_phone, &fields.referred_by_phone),
    ]
    .into_iter()
    .flatten()
    .collect();

    if changes.is_empty() {
        return HandlerResult::Error(
            "I didn't catch what should change. Please say it more clearly.".to_string(),
        );
    }

    let listed: Vec<String> = changes.iter().map(|c| format!("• {}", c)).collect();
    HandlerResult::NeedsConfirmation {
        message: format!(
            "Update project \"{}\"?\n\nChanges:\n{}",
            project.name,
            listed.join("\n")
        ),
        payload: PendingPayload::Update {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            fields: fields.clone(),
            changes,
        },
    }
}

fn find_active_project<'a>(entity: &EntityRef, snapshot: &'a DomainSnapshot) -> Option<&'a ProjectRecord> {
    resolve_ref(entity.id.as_deref(), entity.name.as_deref(), snapshot.active_projects())
}

pub fn add_collaborator(entities: &IntentEntities, input: &HandlerInput<'_>) -> HandlerResult {
    let snapshot = input.snapshot;
    let Some(project) = find_active_project(&entities.project, snapshot) else {
        return project_not_found(&entities.project);
    };

    let wanted = &entities.collaborator;
    let collaborator: Option<&CollaboratorRecord> =
        resolve_ref(wanted.id.as_deref(), wanted.name.as_deref(), &snapshot.collaborators)
            .or_else(|| find_in_text(input.transcript, &snapshot.collaborators));
    let Some(collaborator) = collaborator else {
        return HandlerResult::Error(format!(
            "I couldn't find collaborator \"{}\". Add them on the Collaborators page first.",
            wanted.name.as_deref().unwrap_or("that person")
        ));
    };

    if project.has_member(&collaborator.id) {
        return HandlerResult::Error(format!(
            "\"{}\" is already on project \"{}\".",
            collaborator.name, project.name
        ));
    }

    let responsibilities = entities.responsibilities.clone();
    let with = if responsibilities.is_empty() {
        String::new()
    } else {
        format!(" with responsibilities: {}", responsibilities.join(", "))
    };
    HandlerResult::NeedsConfirmation {
        message: format!(
            "Add \"{}\" to project \"{}\"{}?",
            collaborator.name, project.name, with
        ),
        payload: PendingPayload::Collaborator {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            collaborator: CollaboratorSnapshot {
                collaborator_id: collaborator.id.clone(),
                name: collaborator.name.clone(),
                role: collaborator.role.clone(),
                email: collaborator.email.clone(),
                phone: collaborator.phone.clone(),
            },
            responsibilities,
        },
    }
}

pub fn archive_project(entities: &IntentEntities, input: &HandlerInput<'_>) -> HandlerResult {
    let entity = &entities.project;
    let Some(project) = find_active_project(entity, input.snapshot) else {
        let archived = resolve_ref(entity.id.as_deref(), entity.name.as_deref(), input.snapshot.archived_projects());
        return match archived {
            Some(p) => HandlerResult::Error(format!("Project \"{}\" is already archived.", p.name)),
            None => project_not_found(entity),
        };
    };

    HandlerResult::NeedsConfirmation {
        message: format!(
            "Archive project \"{}\"? It will move to the archived projects list.",
            project.name
        ),
        payload: PendingPayload::Archive {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
        },
    }
}

/// Restoring is reversible by archiving again, so it commits without asking.
pub fn restore_project(entities: &IntentEntities, input: &HandlerInput<'_>) -> HandlerResult {
    let entity = &entities.project;
    let snapshot = input.snapshot;
    let Some(project) = resolve_ref(entity.id.as_deref(), entity.name.as_deref(), snapshot.archived_projects()) else {
        return match find_active_project(entity, snapshot) {
            Some(p) => HandlerResult::Error(format!(
                "Project \"{}\" is already active, nothing to restore.",
                p.name
            )),
            None => HandlerResult::Error(format!(
                "I couldn't find an archived project \"{}\".",
                label(entity)
            )),
        };
    };

    HandlerResult::Success {
        message: format!("Restoring project \"{}\".", project.name),
        action: Some(ImmediateAction::Commit(Mutation::RestoreProject {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
        })),
    }
}

fn task_assignee<'a>(
    entities: &IntentEntities,
    input: &HandlerInput<'a>,
) -> Option<&'a CollaboratorRecord> {
    let snapshot: &'a DomainSnapshot = input.snapshot;
    let collaborators = &snapshot.collaborators;
    let task = &entities.task.assignee;
    if let Some(found) = resolve_ref(task.id.as_deref(), task.name.as_deref(), collaborators) {
        return Some(found);
    }
    let other = &entities.collaborator;
    if let Some(found) = resolve_ref(other.id.as_deref(), other.name.as_deref(), collaborators) {
        return Some(found);
    }
    if input.language.lexicon.has_assign_keyword(input.transcript) {
        return find_in_text(input.transcript, collaborators);
    }
    None
}

pub fn create_task(entities: &IntentEntities, input: &HandlerInput<'_>) -> HandlerResult {
    let Some(title) = entities.task.title.clone() else {
        return HandlerResult::Error(
            "You didn't say the task title. What task should I create?".to_string(),
        );
    };

    let project = find_active_project(&entities.task.project, input.snapshot)
        .or_else(|| find_active_project(&entities.project, input.snapshot));
    let Some(project) = project else {
        let wanted = if entities.task.project.is_empty() {
            &entities.project
        } else {
            &entities.task.project
        };
        return project_not_found(wanted);
    };

    let assignee = task_assignee(entities, input);
    // The classifier is asked for YYYY-MM-DD but may echo the spoken phrase.
    let due_date = entities
        .task
        .due_date
        .as_deref()
        .and_then(|d| input.language.dates.parse_date(d, input.today))
        .map(format_iso);

    let mut task = PendingTask {
        title,
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        assignee_id: assignee.map(|c| c.id.clone()),
        assignee_name: assignee.map(|c| c.name.clone()),
        due_date,
        notes: entities.task.notes.clone(),
        ..PendingTask::default()
    };
    task.refresh_missing();

    let ready = format!(
        "Task \"{}\" for project \"{}\" is ready.",
        task.title, task.project_name
    );
    match task.next_missing() {
        Some(slot) => HandlerResult::NeedsMoreInput {
            message: format!("{}\n\n{}", ready, slot.prompt()),
            next_phase: slot.phase(),
            payload: Some(PendingPayload::Task(task)),
        },
        None => HandlerResult::NeedsConfirmation {
            message: format!("Add this task?\n\n{}", task.summary()),
            payload: PendingPayload::Task(task),
        },
    }
}

pub fn update_task() -> HandlerResult {
    HandlerResult::Error("Editing tasks by voice isn't supported yet.".to_string())
}

pub fn toggle_task_done(entities: &IntentEntities, input: &HandlerInput<'_>) -> HandlerResult {
    let snapshot = input.snapshot;
    let Some(title) = entities.task.title.as_deref() else {
        return HandlerResult::Error("Which task do you mean?".to_string());
    };

    let project = find_active_project(&entities.task.project, snapshot)
        .or_else(|| find_active_project(&entities.project, snapshot));
    let task = match project {
        Some(p) => resolve(
            title,
            snapshot
                .tasks
                .iter()
                .filter(|t| t.project_id.as_deref() == Some(p.id.as_str())),
        ),
        None => resolve(title, &snapshot.tasks),
    };
    let Some(task) = task else {
        return HandlerResult::Error(format!("I couldn't find task \"{}\".", title));
    };

    let done = !task.is_done();
    HandlerResult::Success {
        message: if done {
            format!("Marking \"{}\" as done.", task.title)
        } else {
            format!("Reopening \"{}\".", task.title)
        },
        action: Some(ImmediateAction::Commit(Mutation::ToggleTask {
            task_id: task.id.clone(),
            title: task.title.clone(),
            done,
        })),
    }
}

fn navigate(page: Page) -> HandlerResult {
    HandlerResult::Success {
        message: format!("Opening {}.", page.path()),
        action: Some(ImmediateAction::Navigate(page)),
    }
}
