//! In-memory job store and the runner that executes story jobs.

use crate::StoryPipelineCoordinator;
use async_trait::async_trait;
use chrono::Utc;
use somnia_core::StoryRequest;
use somnia_error::{JobError, JobErrorKind, SomniaResult};
use somnia_interface::{InferenceDriver, JobId, JobRecord, JobStatus, JobStore, ProgressSink};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Default)]
struct StoreInner {
    records: HashMap<JobId, JobRecord>,
    order: Vec<JobId>,
}

/// Job store held in process memory.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryJobStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    #[instrument(skip(self, record), fields(job_id = %record.id))]
    async fn create(&self, record: JobRecord) -> SomniaResult<JobId> {
        let id = record.id;
        let mut inner = self.inner.write().await;
        if inner.records.insert(id, record).is_none() {
            inner.order.push(id);
        }
        debug!("Job created");
        Ok(id)
    }

    async fn get(&self, id: JobId) -> SomniaResult<JobRecord> {
        let inner = self.inner.read().await;
        inner
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| JobError::new(JobErrorKind::NotFound(id.to_string())).into())
    }

    #[instrument(skip(self, record), fields(job_id = %record.id, status = %record.status))]
    async fn update(&self, mut record: JobRecord) -> SomniaResult<()> {
        let mut inner = self.inner.write().await;
        let current = inner
            .records
            .get(&record.id)
            .ok_or_else(|| JobError::new(JobErrorKind::NotFound(record.id.to_string())))?;

        if !current.status.can_transition_to(record.status) {
            warn!(from = %current.status, "Rejected job status transition");
            return Err(JobError::new(JobErrorKind::InvalidTransition {
                id: record.id.to_string(),
                from: current.status.to_string(),
                to: record.status.to_string(),
            })
            .into());
        }

        record.updated_at = Utc::now();
        inner.records.insert(record.id, record);
        Ok(())
    }

    async fn delete(&self, id: JobId) -> SomniaResult<()> {
        let mut inner = self.inner.write().await;
        if inner.records.remove(&id).is_none() {
            return Err(JobError::new(JobErrorKind::NotFound(id.to_string())).into());
        }
        inner.order.retain(|existing| *existing != id);
        debug!(job_id = %id, "Job deleted");
        Ok(())
    }

    async fn list(&self) -> SomniaResult<Vec<JobRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }
}

/// Progress sink forwarding updates into a channel.
#[derive(Debug, Clone)]
struct ChannelProgress {
    tx: mpsc::UnboundedSender<(u8, String)>,
}

impl ProgressSink for ChannelProgress {
    fn update(&self, percent: u8, step: &str) {
        // The receiver only goes away once the run is over.
        let _ = self.tx.send((percent, step.to_string()));
    }
}

/// A submitted job.
#[derive(Debug)]
pub struct JobTicket {
    /// Identifier of the job in the store
    pub id: JobId,
    handle: JoinHandle<()>,
}

impl JobTicket {
    /// Wait until the job has reached a terminal status.
    pub async fn finished(self) -> JobId {
        if let Err(e) = self.handle.await {
            error!(job_id = %self.id, error = %e, "Job task ended abnormally");
        }
        self.id
    }
}

/// Runs story jobs on tokio tasks and records them in a [`JobStore`].
#[derive(Debug)]
pub struct StoryJobRunner<D: ?Sized, S> {
    coordinator: Arc<StoryPipelineCoordinator<D>>,
    store: Arc<S>,
}

impl<D: ?Sized, S> Clone for StoryJobRunner<D, S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            store: Arc::clone(&self.store),
        }
    }
}

impl<D, S> StoryJobRunner<D, S>
where
    D: InferenceDriver + ?Sized + 'static,
    S: JobStore + 'static,
{
    /// Runner executing jobs with `coordinator` and recording them in `store`.
    pub fn new(coordinator: Arc<StoryPipelineCoordinator<D>>, store: Arc<S>) -> Self {
        Self { coordinator, store }
    }

    /// The store jobs are recorded in.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Queue a job and start it on its own task.
    ///
    /// # Errors
    ///
    /// Returns an error if the job record cannot be created.
    #[instrument(skip(self, request), fields(theme = %request.theme))]
    pub async fn submit(&self, request: StoryRequest) -> SomniaResult<JobTicket> {
        let record = JobRecord::new(request);
        let id = self.store.create(record).await?;
        info!(job_id = %id, "Job queued");

        let runner = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = runner.execute(id).await {
                error!(job_id = %id, error = %e, "Job bookkeeping failed");
            }
        });
        Ok(JobTicket { id, handle })
    }

    async fn execute(&self, id: JobId) -> SomniaResult<()> {
        let mut record = self.store.get(id).await?;
        record.status = JobStatus::Running;
        record.step = "starting".to_string();
        self.store.update(record.clone()).await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<(u8, String)>();
        let store = Arc::clone(&self.store);
        let forwarder = tokio::spawn(async move {
            while let Some((percent, step)) = rx.recv().await {
                match store.get(id).await {
                    Ok(mut current) => {
                        current.progress = percent;
                        current.step = step;
                        if let Err(e) = store.update(current).await {
                            warn!(job_id = %id, error = %e, "Progress update rejected");
                        }
                    }
                    Err(e) => warn!(job_id = %id, error = %e, "Progress for missing job"),
                }
            }
        });

        let coordinator = Arc::clone(&self.coordinator);
        let request = record.request.clone();
        let run = tokio::spawn(async move {
            let sink = ChannelProgress { tx };
            coordinator.generate(&request, &sink).await
        });
        let outcome = run.await;

        if let Err(e) = forwarder.await {
            warn!(job_id = %id, error = %e, "Progress forwarder ended abnormally");
        }

        let mut record = self.store.get(id).await?;
        match outcome {
            Ok(result) => {
                info!(job_id = %id, words = result.metrics.word_count, "Job completed");
                record.status = JobStatus::Completed;
                record.progress = 100;
                record.step = "completed".to_string();
                record.result = Some(result);
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "Job failed");
                record.status = JobStatus::Failed;
                record.step = "failed".to_string();
                record.error = Some(e.to_string());
            }
        }
        self.store.update(record).await
    }
}
