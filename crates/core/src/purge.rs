//! Delayed purge of completed tasks
//!
//! Completing a task schedules a purge job that fires ten minutes later.
//! The queue is persisted as JSON so scheduled jobs survive restarts; a
//! worker polls it and hard-deletes tasks that are still completed at
//! fire time. A job is never cancelled by a later toggle — each firing
//! re-checks the store and no-ops if the task changed underneath it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::TagCache;
use crate::task::{TaskRepository, TASKS_TAG};
use crate::{Error, Result};

/// Delay between a completing update and the purge firing
pub const PURGE_DELAY_SECS: i64 = 600;

/// Bounded execution time for a single purge attempt
pub const JOB_TIMEOUT: Duration = Duration::from_secs(60);

/// Attempts before a failing job is dropped
pub const MAX_ATTEMPTS: u32 = 3;

/// A scheduled hard-delete of a completed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeJob {
    pub id: Uuid,
    pub task_id: Uuid,
    pub fire_at: DateTime<Utc>,
}

/// Durable delay queue of purge jobs, persisted as JSON
pub struct PurgeQueue {
    path: PathBuf,
    delay: chrono::Duration,
    jobs: RwLock<Vec<PurgeJob>>,
}

impl PurgeQueue {
    /// Create a queue with the standard ten-minute delay
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_delay(path, chrono::Duration::seconds(PURGE_DELAY_SECS)).await
    }

    /// Create a queue with a custom delay
    pub async fn with_delay(path: impl Into<PathBuf>, delay: chrono::Duration) -> Result<Self> {
        let path = path.into();
        let jobs = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            delay,
            jobs: RwLock::new(jobs),
        })
    }

    /// Persist the queue to disk
    async fn persist(&self) -> Result<()> {
        let jobs = self.jobs.read().await;
        let content = serde_json::to_string_pretty(&*jobs)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Schedule a purge job for `task_id` at now + delay
    ///
    /// Repeated toggling schedules duplicate jobs; each re-checks the
    /// task at its own fire time, so duplicates are benign.
    pub async fn schedule(&self, task_id: Uuid) -> Result<PurgeJob> {
        let job = PurgeJob {
            id: Uuid::new_v4(),
            task_id,
            fire_at: Utc::now() + self.delay,
        };
        {
            let mut jobs = self.jobs.write().await;
            jobs.push(job.clone());
        }
        self.persist().await?;
        debug!(task_id = %task_id, fire_at = %job.fire_at, "scheduled purge job");
        Ok(job)
    }

    /// Remove and return every job due at `now`
    pub async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<PurgeJob>> {
        let due = {
            let mut jobs = self.jobs.write().await;
            let (due, pending): (Vec<_>, Vec<_>) =
                jobs.drain(..).partition(|j| j.fire_at <= now);
            *jobs = pending;
            due
        };
        if !due.is_empty() {
            self.persist().await?;
        }
        Ok(due)
    }

    /// Snapshot of jobs not yet due
    pub async fn pending(&self) -> Vec<PurgeJob> {
        self.jobs.read().await.clone()
    }
}

/// What a purge firing did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Task already hard-deleted or never existed
    Missing,
    /// Task was toggled back to unfinished before firing
    NotCompleted,
    /// Task hard-deleted and cache tag flushed
    Deleted,
}

/// Execute a single purge job against the store
pub async fn run_purge_job(
    job: &PurgeJob,
    store: &dyn TaskRepository,
    cache: &TagCache,
) -> Result<PurgeOutcome> {
    let task = match store.get_with_deleted(job.task_id).await? {
        Some(task) => task,
        None => {
            debug!(task_id = %job.task_id, "purge target already gone");
            return Ok(PurgeOutcome::Missing);
        }
    };

    if !task.finalizado {
        debug!(task_id = %job.task_id, "task no longer completed, skipping purge");
        return Ok(PurgeOutcome::NotCompleted);
    }

    store.force_delete(job.task_id).await?;
    cache.flush(TASKS_TAG).await;
    info!(task_id = %job.task_id, "purged completed task");
    Ok(PurgeOutcome::Deleted)
}

async fn run_with_retries(job: &PurgeJob, store: &dyn TaskRepository, cache: &TagCache) {
    let mut last_error = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match tokio::time::timeout(JOB_TIMEOUT, run_purge_job(job, store, cache)).await {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => {
                warn!(task_id = %job.task_id, attempt, "purge attempt failed: {e}");
                last_error = Some(e);
            }
            Err(_) => {
                warn!(task_id = %job.task_id, attempt, "purge attempt timed out");
                last_error = Some(Error::Storage("purge job timed out".to_string()));
            }
        }
    }

    // Best-effort cleanup: after the final attempt the job is dropped and
    // the failure is only visible in the logs.
    let error = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string());
    error!(task_id = %job.task_id, error = %error, "failed to purge completed task");
}

/// Spawn the purge worker loop, polling the queue at `poll` intervals
pub fn start_purge_worker(
    queue: Arc<PurgeQueue>,
    store: Arc<dyn TaskRepository>,
    cache: Arc<TagCache>,
    poll: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll);
        loop {
            interval.tick().await;
            let due = match queue.take_due(Utc::now()).await {
                Ok(due) => due,
                Err(e) => {
                    warn!("failed to read purge queue: {e}");
                    continue;
                }
            };
            for job in due {
                run_with_retries(&job, store.as_ref(), &cache).await;
            }
        }
    })
}
