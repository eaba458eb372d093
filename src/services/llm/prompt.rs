//! Prompt text for the language model.

use crate::assistant::intent::IntentKind;
use crate::domain::DomainSnapshot;

pub const TRANSCRIPTION_PROMPT: &str = "You are a transcription engine. \
Transcribe exactly what the user said in the audio, without adding or changing anything. \
If the speech is in Persian, respond with Persian text only.";

const SCHEMA: &str = r#"{
  "intent": "<one tag from the list>",
  "projectName": string | null,
  "projectId": string | null,
  "needsProjectName": boolean,
  "updateFields": {
    "clientName": string | null,
    "clientPhone": string | null,
    "referredByName": string | null,
    "referredByPhone": string | null
  },
  "collaboratorInfo": {
    "collaboratorName": string | null,
    "collaboratorId": string | null,
    "responsibilities": string[] | null
  },
  "taskInfo": {
    "title": string | null,
    "projectId": string | null,
    "projectName": string | null,
    "assigneeName": string | null,
    "assigneeId": string | null,
    "dueDate": string | null,
    "notes": string | null
  },
  "missingFields": string[] | null,
  "entities": { "reason": string | null }
}"#;

const RULES: &str = "Rules:
- Return exactly one intent.
- Use null for anything the user did not mention. Never invent values.
- Pick projectId and collaboratorId from the lists below by matching names.
- Keep projectName, collaboratorName and taskInfo.title short, without filler like \"a project called\".
- updateFields is only for update_project_client_info; collaboratorInfo only for add_collaborator_to_project.
- taskInfo is for create_task, update_task and toggle_task_done.
- If the message mentions a task, it is probably create_task or update_task. \"Add Y to project X\" without a task is add_collaborator_to_project.
- taskInfo.dueDate must be YYYY-MM-DD when a date or day is mentioned.
- If create_project has no name, set needsProjectName to true and list \"projectName\" in missingFields.
- For unknown, explain why in entities.reason.
- Reply with the JSON object only: no code fences, no commentary.";

fn describe(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::CreateProject => "create a new project",
        IntentKind::UpdateProjectClientInfo => "change a project's client or referrer name or phone",
        IntentKind::AddCollaboratorToProject => "add an existing collaborator to a project",
        IntentKind::ArchiveProject => "archive a project",
        IntentKind::RestoreProject => "restore an archived project",
        IntentKind::CreateTask => "create a task in a project",
        IntentKind::UpdateTask => "edit an existing task",
        IntentKind::ToggleTaskDone => "mark a task done or not done",
        IntentKind::NavigateToday => "open the Today page",
        IntentKind::NavigateProjects => "open the Projects page",
        IntentKind::NavigateFinance => "open the Finance page",
        IntentKind::SmallTalk => "greetings and chit-chat",
        IntentKind::Unknown => "anything else",
    }
}

/// Instructions plus the current projects and collaborators, so the model
/// can fill in ids. The user message is sent as a separate part.
pub fn classification_prompt(snapshot: &DomainSnapshot) -> String {
    let intents: Vec<String> = IntentKind::ALL
        .iter()
        .map(|k| format!("- {}: {}", k.tag(), describe(*k)))
        .collect();

    let projects: Vec<String> = snapshot
        .projects
        .iter()
        .map(|p| {
            let status = if p.archived { "archived" } else { "active" };
            format!("- id={} name=\"{}\" ({})", p.id, p.name, status)
        })
        .collect();

    let collaborators: Vec<String> = snapshot
        .collaborators
        .iter()
        .map(|c| format!("- id={} name=\"{}\"", c.id, c.name))
        .collect();

    format!(
        "You are the intent classifier of a personal planner app. Users speak English or Persian.\n\n\
         Supported intents:\n{}\n\nReply with JSON in this shape:\n{}\n\n{}\n\n\
         Projects:\n{}\n\nCollaborators:\n{}",
        intents.join("\n"),
        SCHEMA,
        RULES,
        if projects.is_empty() { "(none)".to_string() } else { projects.join("\n") },
        if collaborators.is_empty() { "(none)".to_string() } else { collaborators.join("\n") },
    )
}
