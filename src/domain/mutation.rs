use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fields for `POST /projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub status: String,
    pub priority: u8,
    pub notes: String,
    pub start_date: String,
}

impl NewProject {
    /// A project with the defaults the planner UI uses for quick creation.
    pub fn with_defaults(name: &str, today: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            status: "active".to_string(),
            priority: 3,
            notes: String::new(),
            start_date: today.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Partial update of a project's client/referrer fields.
/// `None` leaves a field untouched; `Some("")` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFieldUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by_phone: Option<String>,
}

impl ProjectFieldUpdate {
    pub fn is_empty(&self) -> bool {
        self.client_name.is_none()
            && self.client_phone.is_none()
            && self.referred_by_name.is_none()
            && self.referred_by_phone.is_none()
    }
}

/// Collaborator details copied at confirmation time, not a live reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorSnapshot {
    pub collaborator_id: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
}

/// Fields for `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub assignee_id: Option<String>,
    pub assigned_to: Option<String>,
    pub due_at: Option<String>,
    pub notes: Option<String>,
    pub priority: u8,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    CreateProject,
    UpdateProject,
    AddCollaborator,
    ArchiveProject,
    RestoreProject,
    CreateTask,
    ToggleTask,
}

/// A confirmed change handed to the planner API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    CreateProject(NewProject),
    UpdateProject {
        project_id: String,
        project_name: String,
        fields: ProjectFieldUpdate,
    },
    AddCollaborator {
        project_id: String,
        project_name: String,
        collaborator: CollaboratorSnapshot,
        responsibilities: Vec<String>,
    },
    ArchiveProject {
        project_id: String,
        project_name: String,
    },
    RestoreProject {
        project_id: String,
        project_name: String,
    },
    CreateTask {
        task: NewTask,
        project_name: String,
    },
    ToggleTask {
        task_id: String,
        title: String,
        done: bool,
    },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::CreateProject(_) => MutationKind::CreateProject,
            Mutation::UpdateProject { .. } => MutationKind::UpdateProject,
            Mutation::AddCollaborator { .. } => MutationKind::AddCollaborator,
            Mutation::ArchiveProject { .. } => MutationKind::ArchiveProject,
            Mutation::RestoreProject { .. } => MutationKind::RestoreProject,
            Mutation::CreateTask { .. } => MutationKind::CreateTask,
            Mutation::ToggleTask { .. } => MutationKind::ToggleTask,
        }
    }

    /// Message shown once the planner API has accepted the change.
    pub fn success_message(&self) -> String {
        match self {
            Mutation::CreateProject(p) => format!("Project \"{}\" was created.", p.name),
            Mutation::UpdateProject { project_name, .. } => {
                format!("Project \"{}\" was updated.", project_name)
            }
            Mutation::AddCollaborator {
                project_name,
                collaborator,
                responsibilities,
                ..
            } => {
                let resp = if responsibilities.is_empty() {
                    String::new()
                } else {
                    format!(" with responsibilities: {}", responsibilities.join(", "))
                };
                format!(
                    "\"{}\" was added to project \"{}\"{}.",
                    collaborator.name, project_name, resp
                )
            }
            Mutation::ArchiveProject { project_name, .. } => {
                format!("Project \"{}\" was archived.", project_name)
            }
            Mutation::RestoreProject { project_name, .. } => {
                format!("Project \"{}\" is active again.", project_name)
            }
            Mutation::CreateTask { task, project_name } => {
                let mut text = format!("Task \"{}\" was added to project \"{}\"", task.title, project_name);
                if let Some(who) = &task.assigned_to {
                    text.push_str(&format!(" for \"{}\"", who));
                }
                if let Some(due) = &task.due_at {
                    text.push_str(&format!(" due {}", &due[..due.len().min(10)]));
                }
                text.push('.');
                text
            }
            Mutation::ToggleTask { title, done, .. } => {
                if *done {
                    format!("Task \"{}\" is marked as done.", title)
                } else {
                    format!("Task \"{}\" is open again.", title)
                }
            }
        }
    }
}
