use chrono::{NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::domain::{CollaboratorSnapshot, Mutation, NewProject, NewTask, ProjectFieldUpdate};

const TASK_PRIORITY: u8 = 3;
const TASK_STATUS: &str = "todo";

/// Where the dialogue is. `Idle` is both the start and the end of every flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingProjectName,
    AwaitingProjectConfirmation,
    AwaitingUpdateConfirmation,
    AwaitingCollaboratorConfirmation,
    AwaitingArchiveConfirmation,
    AwaitingTaskAssignee,
    AwaitingTaskDate,
    AwaitingTaskNotes,
    AwaitingTaskConfirmation,
}

impl Phase {
    /// The task slot this phase is collecting, if any.
    pub fn slot(self) -> Option<TaskSlot> {
        match self {
            Phase::AwaitingTaskAssignee => Some(TaskSlot::Assignee),
            Phase::AwaitingTaskDate => Some(TaskSlot::DueDate),
            Phase::AwaitingTaskNotes => Some(TaskSlot::Notes),
            _ => None,
        }
    }

    pub fn is_task_slot(self) -> bool {
        self.slot().is_some()
    }

    /// Phases resolved only by the confirm/cancel control.
    pub fn is_confirmation(self) -> bool {
        matches!(
            self,
            Phase::AwaitingProjectConfirmation
                | Phase::AwaitingUpdateConfirmation
                | Phase::AwaitingCollaboratorConfirmation
                | Phase::AwaitingArchiveConfirmation
                | Phase::AwaitingTaskConfirmation
        )
    }
}

/// Optional task fields collected one turn at a time, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskSlot {
    Assignee,
    DueDate,
    Notes,
}

impl TaskSlot {
    pub const ORDER: [TaskSlot; 3] = [TaskSlot::Assignee, TaskSlot::DueDate, TaskSlot::Notes];

    pub fn phase(self) -> Phase {
        match self {
            TaskSlot::Assignee => Phase::AwaitingTaskAssignee,
            TaskSlot::DueDate => Phase::AwaitingTaskDate,
            TaskSlot::Notes => Phase::AwaitingTaskNotes,
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            TaskSlot::Assignee => "Who should this task be assigned to? Say a collaborator's name, or \"no\" to leave it unassigned.",
            TaskSlot::DueDate => "When is it due? For example \"tomorrow\", \"next Tuesday\" or 2025-02-15. Say \"no\" for no due date.",
            TaskSlot::Notes => "Any notes for this task? Say \"no\" to skip.",
        }
    }

    pub fn reprompt(self) -> &'static str {
        match self {
            TaskSlot::Assignee => "I couldn't find that collaborator. Say a name from your collaborators list, or \"no\" to skip.",
            TaskSlot::DueDate => "I couldn't understand that date. Try \"tomorrow\", \"in 3 days\", \"next Friday\", 15/02/2025 or 2025-02-15, or say \"no\".",
            TaskSlot::Notes => "Say the notes for this task, or \"no\" to skip.",
        }
    }
}

/// A task being assembled across several turns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingTask {
    pub title: String,
    pub project_id: String,
    pub project_name: String,
    pub assignee_id: Option<String>,
    pub assignee_name: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    /// Slots still to ask for, always in [`TaskSlot::ORDER`].
    pub missing_fields: Vec<TaskSlot>,
    /// Slots the user explicitly declined.
    pub skipped: Vec<TaskSlot>,
}

impl PendingTask {
    pub fn is_filled(&self, slot: TaskSlot) -> bool {
        match slot {
            TaskSlot::Assignee => self.assignee_name.is_some(),
            TaskSlot::DueDate => self.due_date.is_some(),
            TaskSlot::Notes => self.notes.is_some(),
        }
    }

    /// Recomputes `missing_fields` from the filled and skipped slots.
    pub fn refresh_missing(&mut self) {
        self.missing_fields = TaskSlot::ORDER
            .into_iter()
            .filter(|s| !self.is_filled(*s) && !self.skipped.contains(s))
            .collect();
    }

    pub fn next_missing(&self) -> Option<TaskSlot> {
        self.missing_fields.first().copied()
    }

    pub fn skip(&mut self, slot: TaskSlot) {
        match slot {
            TaskSlot::Assignee => {
                self.assignee_id = None;
                self.assignee_name = None;
            }
            TaskSlot::DueDate => self.due_date = None,
            TaskSlot::Notes => self.notes = None,
        }
        if !self.skipped.contains(&slot) {
            self.skipped.push(slot);
        }
        self.refresh_missing();
    }

    /// Human-readable summary shown before confirmation.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Task: \"{}\"", self.title),
            format!("Project: \"{}\"", self.project_name),
        ];
        lines.push(format!(
            "Assignee: {}",
            self.assignee_name.as_deref().unwrap_or("nobody")
        ));
        lines.push(format!("Due: {}", self.due_date.as_deref().unwrap_or("no date")));
        if let Some(notes) = &self.notes {
            lines.push(format!("Notes: {}", notes));
        }
        lines.join("\n")
    }
}

/// One changed field in a project update, rendered for the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<String>,
    pub new: String,
}

impl std::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.old {
            Some(old) => write!(f, "{}: \"{}\" → \"{}\"", self.field, old, self.new),
            None => write!(f, "{}: added → \"{}\"", self.field, self.new),
        }
    }
}

/// Data staged for an action that is waiting on the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingPayload {
    Project {
        name: String,
    },
    Update {
        project_id: String,
        project_name: String,
        fields: ProjectFieldUpdate,
        changes: Vec<FieldChange>,
    },
    Collaborator {
        project_id: String,
        project_name: String,
        collaborator: CollaboratorSnapshot,
        responsibilities: Vec<String>,
    },
    Archive {
        project_id: String,
        project_name: String,
    },
    Task(PendingTask),
}

impl PendingPayload {
    /// The phase in which this payload waits for the confirm control.
    pub fn confirmation_phase(&self) -> Phase {
        match self {
            PendingPayload::Project { .. } => Phase::AwaitingProjectConfirmation,
            PendingPayload::Update { .. } => Phase::AwaitingUpdateConfirmation,
            PendingPayload::Collaborator { .. } => Phase::AwaitingCollaboratorConfirmation,
            PendingPayload::Archive { .. } => Phase::AwaitingArchiveConfirmation,
            PendingPayload::Task(_) => Phase::AwaitingTaskConfirmation,
        }
    }

    pub fn as_task_mut(&mut self) -> Option<&mut PendingTask> {
        match self {
            PendingPayload::Task(task) => Some(task),
            _ => None,
        }
    }

    /// The mutation this payload commits to, with the planner's defaults
    /// filled in. `today` is the project start date.
    pub fn into_mutation(self, today: NaiveDate) -> Mutation {
        match self {
            PendingPayload::Project { name } => Mutation::CreateProject(NewProject::with_defaults(&name, today)),
            PendingPayload::Update {
                project_id,
                project_name,
                fields,
                ..
            } => Mutation::UpdateProject {
                project_id,
                project_name,
                fields,
            },
            PendingPayload::Collaborator {
                project_id,
                project_name,
                collaborator,
                responsibilities,
            } => Mutation::AddCollaborator {
                project_id,
                project_name,
                collaborator,
                responsibilities,
            },
            PendingPayload::Archive {
                project_id,
                project_name,
            } => Mutation::ArchiveProject {
                project_id,
                project_name,
            },
            PendingPayload::Task(task) => {
                let due_at = task.due_date.as_deref().and_then(due_at_midnight_utc);
                Mutation::CreateTask {
                    task: NewTask {
                        project_id: task.project_id,
                        title: task.title,
                        assignee_id: task.assignee_id,
                        assigned_to: task.assignee_name,
                        due_at,
                        notes: task.notes,
                        priority: TASK_PRIORITY,
                        status: TASK_STATUS.to_string(),
                    },
                    project_name: task.project_name,
                }
            }
        }
    }
}

/// `2025-02-15` -> `2025-02-15T00:00:00Z`.
fn due_at_midnight_utc(date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(midnight.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// The whole dialogue for one session. Plain data: the transition function
/// takes it by value and hands back the next one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueState {
    pub phase: Phase,
    pub pending: Option<PendingPayload>,
    /// Mutation handed to the planner API and not yet acknowledged.
    /// While set, the confirm control is disabled.
    pub in_flight: Option<Mutation>,
    /// Bumped on every transition. A classification requested at an older
    /// version is stale and gets dropped.
    pub version: u64,
}

impl DialogueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_committing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_task(&self) -> Option<&PendingTask> {
        match &self.pending {
            Some(PendingPayload::Task(task)) => Some(task),
            _ => None,
        }
    }

    /// Back to `Idle` with nothing staged. `in_flight` and `version` survive:
    /// a commit already sent still has to be acknowledged.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.pending = None;
    }
}
