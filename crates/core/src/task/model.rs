//! Task model definitions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A to-do item
///
/// Field names follow the wire format: `nome` (name), `descricao`
/// (description), `data_limite` (due date), `finalizado` (completed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub data_limite: Option<NaiveDate>,
    pub finalizado: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the task is soft-deleted. Soft-deleted tasks stay in the
    /// store until the purge job hard-deletes them.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task with the given name
    pub fn new(nome: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            nome: nome.into(),
            descricao: None,
            data_limite: None,
            finalizado: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Set the description
    pub fn with_descricao(mut self, descricao: impl Into<String>) -> Self {
        self.descricao = Some(descricao.into());
        self
    }

    /// Set the due date
    pub fn with_data_limite(mut self, data_limite: NaiveDate) -> Self {
        self.data_limite = Some(data_limite);
        self
    }

    /// Whether the task has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
