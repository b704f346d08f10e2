//! HTTP data-access layer for the Tarefas API
//!
//! Thin typed wrapper over the REST surface; decodes the
//! `{success, data|error|errors, message?}` envelope into results.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Validation failed: {0:?}")]
    Validation(BTreeMap<String, Vec<String>>),
}

/// Task as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub data_limite: Option<NaiveDate>,
    pub finalizado: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a task
#[derive(Debug, Default, Serialize)]
pub struct NewTask {
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_limite: Option<String>,
}

/// Partial update payload; unset fields keep their stored value
#[derive(Debug, Default, Serialize)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_limite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalizado: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_error(self) -> ClientError {
        if let Some(errors) = self.errors {
            return ClientError::Validation(errors);
        }
        let message = self
            .error
            .or(self.message)
            .unwrap_or_else(|| "unknown error".to_string());
        ClientError::Api(message)
    }

    fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(self.into_error());
        }
        self.data
            .ok_or_else(|| ClientError::Api("response envelope missing data".to_string()))
    }
}

/// Client for the task API
pub struct TaskClient {
    client: Client,
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data()
    }

    /// GET /api/tasks
    pub async fn list(&self) -> Result<Vec<TaskDto>> {
        let response = self.client.get(self.url("/api/tasks")).send().await?;
        Self::decode(response).await
    }

    /// POST /api/tasks
    pub async fn create(&self, new_task: &NewTask) -> Result<TaskDto> {
        debug!(nome = %new_task.nome, "creating task");
        let response = self
            .client
            .post(self.url("/api/tasks"))
            .json(new_task)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// GET /api/tasks/:id
    pub async fn get(&self, id: Uuid) -> Result<TaskDto> {
        let response = self
            .client
            .get(self.url(&format!("/api/tasks/{id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// PUT /api/tasks/:id
    pub async fn update(&self, id: Uuid, changes: &TaskChanges) -> Result<TaskDto> {
        let response = self
            .client
            .put(self.url(&format!("/api/tasks/{id}")))
            .json(changes)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// PATCH /api/tasks/:id/toggle
    pub async fn toggle(&self, id: Uuid) -> Result<TaskDto> {
        let response = self
            .client
            .patch(self.url(&format!("/api/tasks/{id}/toggle")))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// DELETE /api/tasks/:id
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/tasks/{id}")))
            .send()
            .await?;
        let envelope: Envelope<serde_json::Value> = response.json().await?;
        if envelope.success {
            Ok(())
        } else {
            Err(envelope.into_error())
        }
    }
}
