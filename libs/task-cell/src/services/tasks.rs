// libs/task-cell/src/services/tasks.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument, warn};

use shared_backend::BackendClient;
use shared_utils::dates;

use crate::models::{Task, TaskBuckets, TaskError, TaskRecord, TaskType};
use crate::services::projection;

/// Task fetching and the completion workflow. Completion is strictly
/// server-authoritative: a successful update triggers a full refetch and
/// the refetched list is what callers render; no local flag is flipped.
pub struct TaskService {
    backend: Arc<BackendClient>,
}

impl TaskService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, auth_token))]
    pub async fn fetch_tasks(
        &self,
        customer_id: &str,
        filter: Option<TaskType>,
        auth_token: &str,
    ) -> Result<Vec<Task>, TaskError> {
        let path = match filter {
            Some(kind) => format!("/api/customers/{}/tasks?type={}", customer_id, kind),
            None => format!("/api/customers/{}/tasks", customer_id),
        };

        let records: Vec<TaskRecord> = self
            .backend
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_remote_error)?;

        info!("Fetched {} tasks", records.len());
        Ok(records.into_iter().map(projection::map_record).collect())
    }

    /// Fetch and partition into the date-relative tabs in one call.
    pub async fn fetch_buckets(
        &self,
        customer_id: &str,
        filter: Option<TaskType>,
        auth_token: &str,
    ) -> Result<TaskBuckets, TaskError> {
        let tasks = self.fetch_tasks(customer_id, filter, auth_token).await?;
        Ok(projection::project(tasks, Utc::now().date_naive()))
    }

    /// Submit a completion update, then refetch the full list. The returned
    /// list reflects whatever the server now reports; if the server still
    /// reports the task incomplete, so does the result.
    #[instrument(skip(self, auth_token), fields(task_id = %task.id))]
    pub async fn complete_task(
        &self,
        task: &Task,
        customer_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Task>, TaskError> {
        info!("Completing task {} ({})", task.id, task.name);

        let path = format!("/api/tasks/{}/complete", task.id);
        let body = json!({
            "task_id": task.id,
            "task_name": task.name,
            "remarks": task.remarks,
            "task_date": wire_date(&task.date),
            "task_type": task.kind.to_string().to_uppercase(),
            "completed": true,
        });

        self.backend
            .request::<serde_json::Value>(Method::POST, &path, Some(auth_token), Some(body))
            .await
            .map_err(map_remote_error)?;

        self.fetch_tasks(customer_id, None, auth_token).await
    }
}

/// Completion payloads carry the server's own `DD-MM-YYYY` encoding.
fn wire_date(iso_date: &str) -> String {
    match dates::parse_iso_date(iso_date) {
        Some(date) => date.format("%d-%m-%Y").to_string(),
        None => {
            warn!("Passing through unnormalized task date {:?}", iso_date);
            iso_date.to_string()
        }
    }
}

fn map_remote_error(error: anyhow::Error) -> TaskError {
    let message = error.to_string();
    if message.starts_with("API error") || message.starts_with("Authentication error") {
        TaskError::RemoteError(message)
    } else {
        TaskError::Network(message)
    }
}
