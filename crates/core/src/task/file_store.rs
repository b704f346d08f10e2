//! File-based task storage implementation
//!
//! Stores tasks as JSON in a file on disk.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::Task;
use super::repository::TaskRepository;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory copy of tasks, keyed by ID
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tasks = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tasks: Vec<Task> = serde_json::from_str(&content)?;
            tasks.into_iter().map(|t| (t.id, t)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            tasks: RwLock::new(tasks),
        })
    }

    /// Persist the tasks to disk
    async fn persist(&self) -> Result<()> {
        let tasks = self.tasks.read().await;
        let tasks: Vec<&Task> = tasks.values().collect();
        let content = serde_json::to_string_pretty(&tasks)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        {
            let mut tasks = self.tasks.write().await;
            if tasks.contains_key(&task.id) {
                return Err(Error::InvalidInput(format!(
                    "Task with ID {} already exists",
                    task.id
                )));
            }
            tasks.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn get_with_deleted(&self, id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut tasks: Vec<Task> = tasks
            .values()
            .filter(|t| !t.is_deleted())
            .cloned()
            .collect();
        // Sort by created_at descending (newest first)
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn update(&self, mut task: Task) -> Result<Task> {
        task.updated_at = Utc::now();
        {
            let mut tasks = self.tasks.write().await;
            if !tasks.contains_key(&task.id) {
                return Err(Error::TaskNotFound(task.id.to_string()));
            }
            tasks.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        let marked = {
            let mut tasks = self.tasks.write().await;
            match tasks.get_mut(&id) {
                Some(task) if !task.is_deleted() => {
                    let now = Utc::now();
                    task.deleted_at = Some(now);
                    task.updated_at = now;
                    true
                }
                _ => false,
            }
        };
        if marked {
            self.persist().await?;
        }
        Ok(marked)
    }

    async fn force_delete(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let mut tasks = self.tasks.write().await;
            tasks.remove(&id).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }
}
