pub mod error;
pub mod model;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::realtime::{ChannelId, ChannelRegistry};
use crate::storage::BoardStore;
use error::BoardError;
use model::{BoardMessage, CreateTask, ReorderRequest, Task, TaskPatch};

/// Orchestrates board mutations: validate, apply inside one storage
/// transaction (state change + audit event commit together), then broadcast
/// the resulting delta or snapshot to every connected viewer — including the
/// originator, so a client always observes its own write.
pub struct BoardService {
    store: Arc<BoardStore>,
    registry: Arc<ChannelRegistry>,
}

impl BoardService {
    pub fn new(store: Arc<BoardStore>, registry: Arc<ChannelRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, BoardError> {
        self.store.list_tasks().await
    }

    pub async fn create_task(&self, req: CreateTask) -> Result<Task, BoardError> {
        req.validate()?;
        let task = self.store.create_task(&req).await?;
        debug!(task = %task.id, "task created");
        self.registry
            .broadcast(&BoardMessage::Created { task: task.clone() })
            .await;
        Ok(task)
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, BoardError> {
        patch.validate()?;
        let task = self.store.update_task(id, &patch).await?;
        debug!(task = %task.id, status = task.status.as_str(), "task updated");
        self.registry
            .broadcast(&BoardMessage::Updated { task: task.clone() })
            .await;
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), BoardError> {
        self.store.delete_task(id).await?;
        debug!(task = %id, "task deleted");
        self.registry
            .broadcast(&BoardMessage::Deleted {
                task_id: id.to_string(),
            })
            .await;
        Ok(())
    }

    /// Bulk reorder. All column reassignments commit atomically before the
    /// single snapshot broadcast, so no viewer sees a half-applied reorder.
    /// This path logs no per-task events — a deliberate audit gap that
    /// distinguishes it from single-task moves.
    pub async fn reorder(&self, req: ReorderRequest) -> Result<(), BoardError> {
        let tasks = self.store.reorder(&req).await?;
        debug!(tasks = tasks.len(), "board reordered");
        self.registry.broadcast(&BoardMessage::snapshot(tasks)).await;
        Ok(())
    }

    /// Register a viewer channel seeded with a current-state snapshot.
    ///
    /// The snapshot is read inside the registry's registration critical
    /// section, so a mutation committing while a viewer connects is either
    /// reflected in the snapshot or delivered to the new channel as a delta —
    /// never silently dropped between the two.
    pub async fn connect_viewer(
        &self,
    ) -> Result<(ChannelId, mpsc::UnboundedReceiver<String>), BoardError> {
        let store = Arc::clone(&self.store);
        self.registry
            .connect(|| async move { Ok(BoardMessage::snapshot(store.list_tasks().await?)) })
            .await
    }

    pub async fn disconnect_viewer(&self, id: ChannelId) {
        self.registry.disconnect(id).await;
    }
}
