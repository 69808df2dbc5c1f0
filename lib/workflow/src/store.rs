//! Workflow persistence boundary.
//!
//! The engine only reads workflows through [`WorkflowStore::find`]; the
//! remaining operations back the workflow CRUD surface.

use crate::definition::Workflow;
use crate::error::StoreError;
use async_trait::async_trait;
use callflow_core::{Clock, Result, SystemClock, WorkflowId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for workflow storage.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Loads a workflow, or `None` if it does not exist.
    async fn find(&self, id: &WorkflowId) -> Result<Option<Workflow>, StoreError>;

    /// Lists all workflows, oldest first.
    async fn list(&self) -> Result<Vec<Workflow>, StoreError>;

    /// Stores a new workflow.
    async fn create(&self, workflow: Workflow) -> Result<Workflow, StoreError>;

    /// Replaces a workflow, or returns `None` if it does not exist.
    ///
    /// The stored ID and creation time are kept; the update time is set to now.
    async fn update(&self, id: &WorkflowId, workflow: Workflow)
    -> Result<Option<Workflow>, StoreError>;

    /// Deletes a workflow. Returns false if it did not exist.
    async fn delete(&self, id: &WorkflowId) -> Result<bool, StoreError>;
}

/// Process-local workflow store.
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Uses the given clock for update timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn find(&self, id: &WorkflowId) -> Result<Option<Workflow>, StoreError> {
        Ok(self.workflows.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
        let mut workflows: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        workflows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(workflows)
    }

    async fn create(&self, workflow: Workflow) -> Result<Workflow, StoreError> {
        workflow.validate().map_err(StoreError::from)?;

        let mut workflows = self.workflows.write().await;
        if workflows.contains_key(&workflow.id) {
            return Err(StoreError::AlreadyExists {
                workflow_id: workflow.id.clone(),
            }
            .into());
        }

        debug!(workflow_id = %workflow.id, nodes = workflow.nodes.len(), "workflow created");
        workflows.insert(workflow.id.clone(), workflow.clone());
        Ok(workflow)
    }

    async fn update(
        &self,
        id: &WorkflowId,
        mut workflow: Workflow,
    ) -> Result<Option<Workflow>, StoreError> {
        workflow.validate().map_err(StoreError::from)?;

        let mut workflows = self.workflows.write().await;
        let Some(existing) = workflows.get_mut(id) else {
            return Ok(None);
        };

        workflow.id = id.clone();
        workflow.created_at = existing.created_at;
        workflow.touch(self.clock.now());
        *existing = workflow.clone();

        debug!(workflow_id = %id, "workflow updated");
        Ok(Some(workflow))
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, StoreError> {
        let removed = self.workflows.write().await.remove(id).is_some();
        debug!(workflow_id = %id, removed, "workflow delete");
        Ok(removed)
    }
}
