use serde::{Deserialize, Deserializer, Serialize};

/// Accepts either a JSON string or a JSON number for record ids.
/// The planner API hands out integer primary keys; the assistant treats ids as opaque text.
pub fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn optional_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `null` becomes an empty string. The API leaves optional text columns null.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A collaborator attached to a project. Older rows only carry `id`;
/// newer ones carry `collaborator_id` pointing at the global collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectMember {
    #[serde(deserialize_with = "optional_string_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "optional_string_id", alias = "collaborator_id")]
    pub collaborator_id: Option<String>,
    pub name: String,
    pub responsibilities: Vec<String>,
}

impl ProjectMember {
    /// True when this membership row points at the given collaborator,
    /// through either the current or the legacy id field.
    pub fn refers_to(&self, collaborator_id: &str) -> bool {
        self.collaborator_id.as_deref() == Some(collaborator_id)
            || self.id.as_deref() == Some(collaborator_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
    pub archived: bool,
    #[serde(alias = "client_name", deserialize_with = "lenient_text")]
    pub client_name: String,
    #[serde(alias = "client_phone", deserialize_with = "lenient_text")]
    pub client_phone: String,
    #[serde(alias = "referred_by_name", deserialize_with = "lenient_text")]
    pub referred_by_name: String,
    #[serde(alias = "referred_by_phone", deserialize_with = "lenient_text")]
    pub referred_by_phone: String,
    pub collaborators: Vec<ProjectMember>,
}

impl ProjectRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn has_member(&self, collaborator_id: &str) -> bool {
        self.collaborators.iter().any(|m| m.refers_to(collaborator_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollaboratorRecord {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: String,
}

impl CollaboratorRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskRecord {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "optional_string_id", alias = "project_id")]
    pub project_id: Option<String>,
    /// `todo`, `in_progress` or `done` as stored by the planner API.
    pub status: String,
    pub done: bool,
}

impl TaskRecord {
    pub fn new(id: &str, title: &str, project_id: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            project_id: project_id.map(str::to_string),
            status: "todo".to_string(),
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done || self.status == "done"
    }
}

/// Read-only view of the planner's collections, refreshed by the caller before each turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSnapshot {
    pub projects: Vec<ProjectRecord>,
    pub collaborators: Vec<CollaboratorRecord>,
    pub tasks: Vec<TaskRecord>,
}

impl DomainSnapshot {
    pub fn active_projects(&self) -> impl Iterator<Item = &ProjectRecord> + Clone {
        self.projects.iter().filter(|p| !p.archived)
    }

    pub fn archived_projects(&self) -> impl Iterator<Item = &ProjectRecord> + Clone {
        self.projects.iter().filter(|p| p.archived)
    }

    pub fn project(&self, id: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn collaborator(&self, id: &str) -> Option<&CollaboratorRecord> {
        self.collaborators.iter().find(|c| c.id == id)
    }
}
