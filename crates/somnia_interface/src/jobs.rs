//! Job store trait and job records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use somnia_core::{StoryRequest, StoryResult};
use somnia_error::SomniaResult;

/// Unique job identifier (UUID v4).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for JobId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet started.
    Queued,
    /// A run is in progress.
    Running,
    /// Finished with a result.
    Completed,
    /// Finished without a result.
    Failed,
}

impl JobStatus {
    /// Whether the job has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Jobs only move forward; a status may be re-applied to itself so that
    /// progress updates on a running job are accepted.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Queued, Queued | Running | Failed) => true,
            (Running, Running | Completed | Failed) => true,
            _ => false,
        }
    }
}

/// Everything known about one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// What was asked for.
    pub request: StoryRequest,
    /// Last reported progress (0–100).
    pub progress: u8,
    /// Last reported step label.
    pub step: String,
    /// Result once completed.
    #[serde(default)]
    pub result: Option<StoryResult>,
    /// Failure message once failed.
    #[serde(default)]
    pub error: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// A freshly queued job for `request`.
    pub fn new(request: StoryRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Queued,
            request,
            progress: 0,
            step: "queued".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Storage for job records.
///
/// Replaces any process-global registry: callers own a store and hand it to
/// whatever needs it.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record, returning its identifier.
    async fn create(&self, record: JobRecord) -> SomniaResult<JobId>;

    /// Fetch a record.
    ///
    /// # Errors
    ///
    /// Returns a not-found job error when no record has this identifier.
    async fn get(&self, id: JobId) -> SomniaResult<JobRecord>;

    /// Replace a record after checking the status transition.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown identifiers and an
    /// invalid-transition error when the status would move backwards.
    async fn update(&self, record: JobRecord) -> SomniaResult<()>;

    /// Remove a record.
    async fn delete(&self, id: JobId) -> SomniaResult<()>;

    /// All records, oldest first.
    async fn list(&self) -> SomniaResult<Vec<JobRecord>>;
}
