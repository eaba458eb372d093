use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ProjectFieldUpdate;

/// The fixed set of things a voice command can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    CreateProject,
    UpdateProjectClientInfo,
    AddCollaboratorToProject,
    ArchiveProject,
    RestoreProject,
    CreateTask,
    UpdateTask,
    ToggleTaskDone,
    NavigateToday,
    NavigateProjects,
    NavigateFinance,
    SmallTalk,
    Unknown,
}

impl IntentKind {
    pub const ALL: [IntentKind; 13] = [
        IntentKind::CreateProject,
        IntentKind::UpdateProjectClientInfo,
        IntentKind::AddCollaboratorToProject,
        IntentKind::ArchiveProject,
        IntentKind::RestoreProject,
        IntentKind::CreateTask,
        IntentKind::UpdateTask,
        IntentKind::ToggleTaskDone,
        IntentKind::NavigateToday,
        IntentKind::NavigateProjects,
        IntentKind::NavigateFinance,
        IntentKind::SmallTalk,
        IntentKind::Unknown,
    ];

    /// Wire tag used in the classifier prompt and response.
    pub fn tag(self) -> &'static str {
        match self {
            IntentKind::CreateProject => "create_project",
            IntentKind::UpdateProjectClientInfo => "update_project_client_info",
            IntentKind::AddCollaboratorToProject => "add_collaborator_to_project",
            IntentKind::ArchiveProject => "archive_project",
            IntentKind::RestoreProject => "restore_project",
            IntentKind::CreateTask => "create_task",
            IntentKind::UpdateTask => "update_task",
            IntentKind::ToggleTaskDone => "toggle_task_done",
            IntentKind::NavigateToday => "navigate_today",
            IntentKind::NavigateProjects => "navigate_projects",
            IntentKind::NavigateFinance => "navigate_finance",
            IntentKind::SmallTalk => "small_talk",
            IntentKind::Unknown => "unknown",
        }
    }

    /// `None` for tags outside the supported set. `update_project` is the
    /// older spelling of `update_project_client_info`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        if tag == "update_project" {
            return Some(IntentKind::UpdateProjectClientInfo);
        }
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// Classifier output as it comes off the wire. Every leaf is a raw JSON
/// value because the model is free to send `null`, `""`, numbers for ids or
/// a string where a list belongs; [`super::normalize`] sorts that out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawClassification {
    pub intent: Value,
    pub project_name: Value,
    pub project_id: Value,
    pub needs_project_name: Value,
    pub update_fields: Option<RawUpdateFields>,
    pub collaborator_info: Option<RawCollaboratorInfo>,
    pub task_info: Option<RawTaskInfo>,
    pub missing_fields: Value,
    pub entities: Option<RawEntities>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUpdateFields {
    pub client_name: Value,
    pub client_phone: Value,
    pub referred_by_name: Value,
    pub referred_by_phone: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCollaboratorInfo {
    pub collaborator_name: Value,
    pub collaborator_id: Value,
    pub responsibilities: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTaskInfo {
    pub title: Value,
    pub project_id: Value,
    pub project_name: Value,
    pub assignee_name: Value,
    pub assignee_id: Value,
    pub due_date: Value,
    pub notes: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntities {
    pub reason: Value,
}

/// A reference to a record by id, by name, or both. Either side may be
/// absent; handlers resolve id first and fall back to the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl EntityRef {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: Some(name.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEntities {
    pub title: Option<String>,
    pub project: EntityRef,
    pub assignee: EntityRef,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentEntities {
    pub project: EntityRef,
    pub needs_project_name: bool,
    pub update_fields: ProjectFieldUpdate,
    pub collaborator: EntityRef,
    pub responsibilities: Vec<String>,
    pub task: TaskEntities,
    pub missing_fields: Vec<String>,
}

/// Classifier result after trimming, null handling and local re-resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIntent {
    pub kind: IntentKind,
    pub entities: IntentEntities,
    /// Diagnostic text for `Unknown`.
    pub reason: Option<String>,
    /// Set when the classifier could not be reached at all.
    pub transport_failure: bool,
}

impl NormalizedIntent {
    pub fn new(kind: IntentKind, entities: IntentEntities) -> Self {
        Self {
            kind,
            entities,
            reason: None,
            transport_failure: false,
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Unknown,
            entities: IntentEntities::default(),
            reason: Some(reason.into()),
            transport_failure: false,
        }
    }

    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self {
            transport_failure: true,
            ..Self::unknown(reason)
        }
    }
}
