//! Task API endpoints
//!
//! RESTful API for task CRUD operations. Every response uses the
//! `{success, data|error|errors, message?}` envelope.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tarefas_core::task::Task;

use crate::error::{ApiError, FieldErrors};
use crate::state::AppState;

const NOME_MAX_LEN: usize = 255;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub data_limite: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub data_limite: Option<String>,
    #[serde(default)]
    pub finalizado: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub data_limite: Option<NaiveDate>,
    pub finalizado: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            nome: task.nome,
            descricao: task.descricao,
            data_limite: task.data_limite,
            finalizado: task.finalizado,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Validation
// ============================================================================

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn validate_nome(nome: &str, errors: &mut FieldErrors) {
    if nome.trim().is_empty() {
        push_error(errors, "nome", "The nome field is required.");
    } else if nome.chars().count() > NOME_MAX_LEN {
        push_error(
            errors,
            "nome",
            format!("The nome field must not be greater than {NOME_MAX_LEN} characters."),
        );
    }
}

fn parse_data_limite(raw: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            push_error(errors, "data_limite", "The data_limite field must be a valid date.");
            None
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List all non-deleted tasks, newest first
async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<TaskResponse>>>, ApiError> {
    let tasks = state.service().list().await?;
    Ok(Json(DataEnvelope::new(
        tasks.into_iter().map(TaskResponse::from).collect(),
    )))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<TaskResponse>>), ApiError> {
    let mut errors = FieldErrors::new();

    match &req.nome {
        Some(nome) => validate_nome(nome, &mut errors),
        None => push_error(&mut errors, "nome", "The nome field is required."),
    }
    let data_limite = req
        .data_limite
        .as_deref()
        .and_then(|raw| parse_data_limite(raw, &mut errors));

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let mut task = Task::new(req.nome.unwrap_or_default());
    if let Some(descricao) = req.descricao {
        task = task.with_descricao(descricao);
    }
    if let Some(date) = data_limite {
        task = task.with_data_limite(date);
    }

    let created = state.service().create(task).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(created.into()))))
}

/// GET /api/tasks/:id - Get a single task (cached read path)
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataEnvelope<TaskResponse>>, ApiError> {
    match state.service().get(id).await? {
        Some(task) => Ok(Json(DataEnvelope::new(task.into()))),
        None => Err(ApiError::NotFound(format!("Task {} not found", id))),
    }
}

/// PUT /api/tasks/:id - Partially update a task
///
/// Only supplied fields are validated and applied.
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<DataEnvelope<TaskResponse>>, ApiError> {
    let mut task = state
        .service()
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", id)))?;

    let mut errors = FieldErrors::new();
    if let Some(nome) = &req.nome {
        validate_nome(nome, &mut errors);
    }
    let data_limite = req
        .data_limite
        .as_deref()
        .and_then(|raw| parse_data_limite(raw, &mut errors));

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(nome) = req.nome {
        task.nome = nome;
    }
    if let Some(descricao) = req.descricao {
        task.descricao = Some(descricao);
    }
    if let Some(date) = data_limite {
        task.data_limite = Some(date);
    }
    if let Some(finalizado) = req.finalizado {
        task.finalizado = finalizado;
    }

    let updated = state.service().update(task).await?;
    Ok(Json(DataEnvelope::new(updated.into())))
}

/// PATCH /api/tasks/:id/toggle - Flip the completion flag
async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataEnvelope<TaskResponse>>, ApiError> {
    let toggled = state.service().toggle(id).await?;
    Ok(Json(DataEnvelope::new(toggled.into())))
}

/// DELETE /api/tasks/:id - Soft-delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    let deleted = state.service().delete(id).await?;

    if deleted {
        Ok(Json(MessageEnvelope {
            success: true,
            message: "Task deleted successfully".to_string(),
        }))
    } else {
        Err(ApiError::NotFound(format!("Task {} not found", id)))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle", patch(toggle_task))
}
