//! Application state

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tarefas_core::cache::TagCache;
use tarefas_core::purge::PurgeQueue;
use tarefas_core::task::{FileTaskStore, TaskRepository, TaskService};

use crate::response_cache::ResponseCache;

/// TTL of the transport-level GET response cache
const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    data_dir: PathBuf,
    service: TaskService,
    store: Arc<dyn TaskRepository>,
    cache: Arc<TagCache>,
    purge_queue: Arc<PurgeQueue>,
    response_cache: Arc<ResponseCache>,
}

impl AppState {
    /// Create a new AppState with the given data directory
    pub async fn new(data_dir: PathBuf) -> tarefas_core::Result<Self> {
        let purge_queue = PurgeQueue::new(data_dir.join("purge_queue.json")).await?;
        Self::with_purge_queue(data_dir, purge_queue).await
    }

    /// Create a new AppState with a custom purge delay (used by tests)
    pub async fn with_purge_delay(
        data_dir: PathBuf,
        delay: chrono::Duration,
    ) -> tarefas_core::Result<Self> {
        let purge_queue =
            PurgeQueue::with_delay(data_dir.join("purge_queue.json"), delay).await?;
        Self::with_purge_queue(data_dir, purge_queue).await
    }

    async fn with_purge_queue(
        data_dir: PathBuf,
        purge_queue: PurgeQueue,
    ) -> tarefas_core::Result<Self> {
        let store: Arc<dyn TaskRepository> =
            Arc::new(FileTaskStore::new(data_dir.join("tasks.json")).await?);
        let cache = Arc::new(TagCache::new());
        let purge_queue = Arc::new(purge_queue);
        let service = TaskService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&purge_queue),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                data_dir,
                service,
                store,
                cache,
                purge_queue,
                response_cache: Arc::new(ResponseCache::new(RESPONSE_CACHE_TTL)),
            }),
        })
    }

    /// Get reference to the task service
    pub fn service(&self) -> &TaskService {
        &self.inner.service
    }

    /// Get the task store handle
    pub fn store(&self) -> Arc<dyn TaskRepository> {
        Arc::clone(&self.inner.store)
    }

    /// Get the tag cache handle
    pub fn cache(&self) -> Arc<TagCache> {
        Arc::clone(&self.inner.cache)
    }

    /// Get the purge queue handle
    pub fn purge_queue(&self) -> Arc<PurgeQueue> {
        Arc::clone(&self.inner.purge_queue)
    }

    /// Get the response cache handle
    pub fn response_cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.inner.response_cache)
    }

    /// Data directory backing the stores
    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }
}
