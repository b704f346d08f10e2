//! Task lifecycle service
//!
//! Every mutation entry point fires the post-write hooks itself: flush
//! the `tasks` cache tag, and schedule a delayed purge when an update
//! flips `finalizado` from false to true.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::model::Task;
use super::repository::TaskRepository;
use crate::cache::TagCache;
use crate::purge::PurgeQueue;
use crate::{Error, Result};

/// Cache tag covering all task read entries
pub const TASKS_TAG: &str = "tasks";

/// TTL for cached single-task reads
pub const TASK_READ_TTL: Duration = Duration::from_secs(300);

/// Task store operations with cache invalidation and purge scheduling
pub struct TaskService {
    store: Arc<dyn TaskRepository>,
    cache: Arc<TagCache>,
    purge: Arc<PurgeQueue>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskRepository>,
        cache: Arc<TagCache>,
        purge: Arc<PurgeQueue>,
    ) -> Self {
        Self {
            store,
            cache,
            purge,
        }
    }

    /// Insert a new task and flush the tag
    pub async fn create(&self, task: Task) -> Result<Task> {
        let created = self.store.create(task).await?;
        self.cache.flush(TASKS_TAG).await;
        Ok(created)
    }

    /// Cached single-task read (non-deleted only)
    pub async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let store = Arc::clone(&self.store);
        self.cache
            .remember(TASKS_TAG, &format!("tasks.{id}"), TASK_READ_TTL, move || {
                async move { store.get(id).await }
            })
            .await
    }

    /// Uncached single-task read, used as the base for mutations
    pub async fn find(&self, id: Uuid) -> Result<Option<Task>> {
        self.store.get(id).await
    }

    /// List all non-deleted tasks, newest first
    ///
    /// Deliberately bypasses the tag cache so listings are always fresh;
    /// only the single-task read path is cached.
    pub async fn list(&self) -> Result<Vec<Task>> {
        self.store.list().await
    }

    /// Write an updated task back to the store
    ///
    /// A false-to-true transition of `finalizado` schedules a delayed
    /// purge. The transition must be a change; updates that leave an
    /// already-completed task completed schedule nothing.
    pub async fn update(&self, task: Task) -> Result<Task> {
        let prior = self
            .store
            .get_with_deleted(task.id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(task.id.to_string()))?;

        let updated = self.store.update(task).await?;

        // Flush first: once the store write landed, the cache must not
        // serve the old copy even if scheduling fails below.
        self.cache.flush(TASKS_TAG).await;

        if !prior.finalizado && updated.finalizado {
            self.purge.schedule(updated.id).await?;
        }

        Ok(updated)
    }

    /// Flip `finalizado` on the task with the given ID
    pub async fn toggle(&self, id: Uuid) -> Result<Task> {
        let mut task = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        task.finalizado = !task.finalizado;
        self.update(task).await
    }

    /// Soft-delete a task and flush the tag
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.store.soft_delete(id).await?;
        if deleted {
            self.cache.flush(TASKS_TAG).await;
        }
        Ok(deleted)
    }
}
