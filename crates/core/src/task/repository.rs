//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Task;
use crate::Result;

/// Repository interface for task CRUD operations
///
/// Soft-deleted tasks are excluded from `get` and `list` but remain
/// reachable through `get_with_deleted` until hard-deleted.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task
    async fn create(&self, task: Task) -> Result<Task>;

    /// Get a task by ID, excluding soft-deleted tasks
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Get a task by ID, including soft-deleted tasks
    async fn get_with_deleted(&self, id: Uuid) -> Result<Option<Task>>;

    /// Get all non-deleted tasks, newest first
    async fn list(&self) -> Result<Vec<Task>>;

    /// Update an existing task
    async fn update(&self, task: Task) -> Result<Task>;

    /// Soft-delete a task by ID; returns false if it was missing or
    /// already soft-deleted
    async fn soft_delete(&self, id: Uuid) -> Result<bool>;

    /// Hard-delete a task by ID, including soft-deleted tasks
    async fn force_delete(&self, id: Uuid) -> Result<bool>;
}
