mod store;

use parking_lot::RwLock;
use sched_core::Planner;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};
use types::AutofillResult;
use utoipa::ToSchema;
use uuid::Uuid;

pub use store::{AutofillOrder, Checkout, PlanStore, StoreError};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Committed { revision: u64, result: AutofillResult },
    /// The plan moved on while the job ran; nothing was written.
    Conflict { message: String },
    Failed { message: String },
}

#[derive(Clone)]
pub struct InMemJobs<P: Planner> {
    inner: Arc<RwLock<HashMap<String, JobStatus>>>,
    planner: Arc<P>,
    store: Arc<PlanStore>,
}

impl<P: Planner> InMemJobs<P> {
    pub fn new(planner: P, store: Arc<PlanStore>) -> Self {
        Self {
            inner: Default::default(),
            planner: Arc::new(planner),
            store,
        }
    }

    pub fn store(&self) -> &Arc<PlanStore> {
        &self.store
    }

    /// Checks out a snapshot for the order and plans it on a background task.
    ///
    /// Fails right away when the cohort is unknown or already being filled.
    pub fn enqueue(&self, order: AutofillOrder) -> Result<JobId, StoreError> {
        let checkout = self.store.checkout(order)?;
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let planner = self.planner.clone();
        let store = self.store.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            {
                let mut w = map.write();
                w.insert(id_for_task.clone(), JobStatus::Running);
            }
            let env = checkout.envelope().clone();
            let outcome = planner.plan(env).await;
            let status = match outcome {
                Ok(result) => match store.commit(checkout, &result) {
                    Ok(revision) => JobStatus::Committed { revision, result },
                    Err(e @ StoreError::StaleSnapshot { .. }) => {
                        warn!(job = %id_for_task, %e, "discarding auto-fill result");
                        JobStatus::Conflict {
                            message: e.to_string(),
                        }
                    }
                    Err(e) => {
                        error!(?e, "commit failed");
                        JobStatus::Failed {
                            message: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    drop(checkout);
                    error!(?e, "job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            map.write().insert(id_for_task, status);
        });

        Ok(JobId(id))
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}
