use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::AssistantConfig;
use crate::domain::{CollaboratorRecord, DomainSnapshot, Mutation, ProjectRecord, TaskRecord};
use crate::error::TransportError;
use crate::services::ports::{MutationApi, SnapshotSource};

/// REST client for the planner backend.
#[derive(Clone)]
pub struct PlannerApiClient {
    client: Client,
    base_url: String,
}

/// Row ids are integers on the server and opaque strings here.
fn id_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id),
    }
}

fn optional_id(id: Option<&str>) -> Value {
    id.map(id_value).unwrap_or(Value::Null)
}

/// Method, path and JSON body for one mutation.
pub fn request_for(mutation: &Mutation) -> (Method, String, Option<Value>) {
    match mutation {
        Mutation::CreateProject(project) => (
            Method::POST,
            "/projects".to_string(),
            Some(json!({
                "name": project.name,
                "status": project.status,
                "priority": project.priority,
                "startDate": project.start_date,
                "notes": project.notes,
            })),
        ),
        Mutation::UpdateProject {
            project_id, fields, ..
        } => (
            Method::PUT,
            format!("/projects/{}", project_id),
            serde_json::to_value(fields).ok(),
        ),
        Mutation::AddCollaborator {
            project_id,
            collaborator,
            responsibilities,
            ..
        } => (
            Method::POST,
            format!("/projects/{}/collaborators", project_id),
            Some(json!({
                "collaboratorId": id_value(&collaborator.collaborator_id),
                "responsibilities": responsibilities,
            })),
        ),
        Mutation::ArchiveProject { project_id, .. } => {
            (Method::PATCH, format!("/projects/{}/archive", project_id), None)
        }
        Mutation::RestoreProject { project_id, .. } => {
            (Method::PATCH, format!("/projects/{}/restore", project_id), None)
        }
        Mutation::CreateTask { task, .. } => (
            Method::POST,
            "/tasks".to_string(),
            Some(json!({
                "projectId": id_value(&task.project_id),
                "title": task.title,
                "dueAt": task.due_at,
                "priority": task.priority,
                "status": task.status,
                "notes": task.notes,
                "assigneeId": optional_id(task.assignee_id.as_deref()),
            })),
        ),
        Mutation::ToggleTask { task_id, .. } => (Method::PATCH, format!("/tasks/{}/toggle", task_id), None),
    }
}

impl PlannerApiClient {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout())
                .build()
                .unwrap_or_default(),
            base_url: config.planner_api_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| TransportError::Malformed(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl MutationApi for PlannerApiClient {
    async fn apply(&self, mutation: &Mutation) -> Result<(), TransportError> {
        let (method, path, body) = request_for(mutation);
        info!("planner api {} {}", method, path);
        let mut builder = self.request(method, &path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        match self.send(builder).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("planner api {} failed: {}", path, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for PlannerApiClient {
    async fn snapshot(&self) -> Result<DomainSnapshot, TransportError> {
        let (active, archived, collaborators, tasks) = tokio::try_join!(
            self.get::<Vec<ProjectRecord>>("/projects?archived=false"),
            self.get::<Vec<ProjectRecord>>("/projects?archived=true"),
            self.get::<Vec<CollaboratorRecord>>("/collaborators"),
            self.get::<Vec<TaskRecord>>("/tasks"),
        )?;

        let mut projects = active;
        projects.extend(archived.into_iter().map(|p| p.archived()));
        debug!(
            "snapshot: {} projects, {} collaborators, {} tasks",
            projects.len(),
            collaborators.len(),
            tasks.len()
        );
        Ok(DomainSnapshot {
            projects,
            collaborators,
            tasks,
        })
    }
}
