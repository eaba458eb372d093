//! Turns raw classifier output into a [`NormalizedIntent`].
//!
//! The classifier only saw a snapshot of the planner when it answered, so
//! nothing it returns is trusted as-is: ids that do not exist locally are
//! dropped and the task assignee is resolved again against the live
//! collaborator list.

use serde_json::Value;

use super::types::{
    EntityRef, IntentEntities, IntentKind, NormalizedIntent, RawClassification, RawCollaboratorInfo,
    RawTaskInfo, RawUpdateFields, TaskEntities,
};
use crate::assistant::resolver::resolve_ref;
use crate::domain::{DomainSnapshot, ProjectFieldUpdate};
use crate::error::TransportError;

const RESPONSIBILITY_DELIMITERS: [char; 4] = [',', '،', ';', '؛'];

/// Extracts the JSON object from model output. Models like to wrap JSON in
/// prose or code fences, so everything outside the outermost braces is ignored.
pub fn parse_model_output(text: &str) -> Result<RawClassification, TransportError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(TransportError::Malformed(
                "no JSON object in model output".to_string(),
            ))
        }
    };
    serde_json::from_str(json).map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Trimmed text, with `null`, blanks and the literal string "null" treated
/// as "not mentioned". Numbers are accepted for id-like fields.
pub fn clean_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() || text.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(text)
    }
}

/// Like [`clean_text`], but a blank string survives as `Some("")` so an
/// update can clear a field. Only `null`, a missing key and "null" mean
/// "leave unchanged".
pub fn clean_update_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().eq_ignore_ascii_case("null") => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn clean_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// A list of strings, or one string split on commas and semicolons
/// (Latin and Arabic forms). Blank entries are dropped.
pub fn clean_list(value: &Value) -> Vec<String> {
    let parts: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(clean_text).collect(),
        Value::String(s) => s
            .split(RESPONSIBILITY_DELIMITERS)
            .map(|p| p.trim().to_string())
            .collect(),
        _ => Vec::new(),
    };
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn known_project(id: Option<String>, snapshot: &DomainSnapshot) -> Option<String> {
    id.filter(|id| snapshot.project(id).is_some())
}

fn known_collaborator(id: Option<String>, snapshot: &DomainSnapshot) -> Option<String> {
    id.filter(|id| snapshot.collaborator(id).is_some())
}

fn update_fields(raw: Option<&RawUpdateFields>) -> ProjectFieldUpdate {
    let Some(raw) = raw else {
        return ProjectFieldUpdate::default();
    };
    ProjectFieldUpdate {
        client_name: clean_update_field(&raw.client_name),
        client_phone: clean_update_field(&raw.client_phone),
        referred_by_name: clean_update_field(&raw.referred_by_name),
        referred_by_phone: clean_update_field(&raw.referred_by_phone),
    }
}

fn collaborator_info(raw: Option<&RawCollaboratorInfo>, snapshot: &DomainSnapshot) -> (EntityRef, Vec<String>) {
    let Some(raw) = raw else {
        return (EntityRef::default(), Vec::new());
    };
    let entity = EntityRef {
        id: known_collaborator(clean_text(&raw.collaborator_id), snapshot),
        name: clean_text(&raw.collaborator_name),
    };
    (entity, clean_list(&raw.responsibilities))
}

/// The upstream assignee is advisory. A collaborator found locally replaces
/// it with the canonical id and name; one that cannot be found is dropped so
/// the dialogue asks for it instead of committing a dangling reference.
fn assignee(raw: &RawTaskInfo, snapshot: &DomainSnapshot) -> EntityRef {
    let id = clean_text(&raw.assignee_id);
    let name = clean_text(&raw.assignee_name);
    if id.is_none() && name.is_none() {
        return EntityRef::default();
    }
    match resolve_ref(id.as_deref(), name.as_deref(), &snapshot.collaborators) {
        Some(found) => EntityRef {
            id: Some(found.id.clone()),
            name: Some(found.name.clone()),
        },
        None => {
            tracing::debug!("classifier assignee not found among collaborators, dropping it");
            EntityRef::default()
        }
    }
}

fn task(raw: Option<&RawTaskInfo>, snapshot: &DomainSnapshot) -> TaskEntities {
    let Some(raw) = raw else {
        return TaskEntities::default();
    };
    TaskEntities {
        title: clean_text(&raw.title),
        project: EntityRef {
            id: known_project(clean_text(&raw.project_id), snapshot),
            name: clean_text(&raw.project_name),
        },
        assignee: assignee(raw, snapshot),
        due_date: clean_text(&raw.due_date),
        notes: clean_text(&raw.notes),
    }
}

pub fn normalize(raw: &RawClassification, snapshot: &DomainSnapshot) -> NormalizedIntent {
    let reason = raw
        .entities
        .as_ref()
        .and_then(|e| clean_text(&e.reason));

    let kind = match clean_text(&raw.intent) {
        Some(tag) => match IntentKind::from_tag(&tag) {
            Some(kind) => kind,
            None => {
                tracing::warn!("unsupported intent tag from classifier: {}", tag);
                return NormalizedIntent::unknown(format!("unsupported intent \"{}\"", tag));
            }
        },
        None => return NormalizedIntent::unknown(reason.unwrap_or_else(|| "no intent given".to_string())),
    };

    let (collaborator, responsibilities) = collaborator_info(raw.collaborator_info.as_ref(), snapshot);
    let entities = IntentEntities {
        project: EntityRef {
            id: known_project(clean_text(&raw.project_id), snapshot),
            name: clean_text(&raw.project_name),
        },
        needs_project_name: clean_bool(&raw.needs_project_name),
        update_fields: update_fields(raw.update_fields.as_ref()),
        collaborator,
        responsibilities,
        task: task(raw.task_info.as_ref(), snapshot),
        missing_fields: clean_list(&raw.missing_fields),
    };

    NormalizedIntent {
        kind,
        entities,
        reason,
        transport_failure: false,
    }
}
