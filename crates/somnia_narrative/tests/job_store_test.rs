//! Tests for the in-memory job store and the story job runner

mod test_utils;

use somnia_core::StoryRequest;
use somnia_error::{JobErrorKind, SomniaErrorKind};
use somnia_interface::{JobId, JobRecord, JobStatus, JobStore};
use somnia_narrative::{InMemoryJobStore, StoryJobRunner, StoryPipelineCoordinator};
use std::sync::Arc;
use test_utils::{FailingDriver, StoryDriver, fast_config};

fn request(theme: &str) -> StoryRequest {
    StoryRequest::builder()
        .theme(theme)
        .duration_minutes(5)
        .seed(1)
        .build()
}

fn is_not_found(error: &somnia_error::SomniaError) -> bool {
    matches!(
        error.kind(),
        SomniaErrorKind::Job(job) if matches!(job.kind(), JobErrorKind::NotFound(_))
    )
}

#[tokio::test]
async fn test_create_get_list_delete() {
    let store = InMemoryJobStore::new();
    let first = store.create(JobRecord::new(request("lake"))).await.unwrap();
    let second = store.create(JobRecord::new(request("forest"))).await.unwrap();

    let fetched = store.get(first).await.unwrap();
    assert_eq!(fetched.status, JobStatus::Queued);
    assert_eq!(fetched.request.theme, "lake");

    let ids: Vec<JobId> = store.list().await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first, second]);

    store.delete(first).await.unwrap();
    let ids: Vec<JobId> = store.list().await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second]);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let store = InMemoryJobStore::new();
    let ghost = JobRecord::new(request("ghost"));

    assert!(is_not_found(&store.get(ghost.id).await.unwrap_err()));
    assert!(is_not_found(&store.delete(ghost.id).await.unwrap_err()));
    assert!(is_not_found(&store.update(ghost).await.unwrap_err()));
}

#[tokio::test]
async fn test_status_only_moves_forward() {
    let store = InMemoryJobStore::new();
    let id = store.create(JobRecord::new(request("meadow"))).await.unwrap();

    let mut record = store.get(id).await.unwrap();
    record.status = JobStatus::Completed;
    let error = store.update(record).await.unwrap_err();
    assert!(matches!(
        error.kind(),
        SomniaErrorKind::Job(job) if matches!(job.kind(), JobErrorKind::InvalidTransition { .. })
    ));

    let mut record = store.get(id).await.unwrap();
    record.status = JobStatus::Running;
    record.progress = 40;
    store.update(record).await.unwrap();

    let mut record = store.get(id).await.unwrap();
    assert_eq!(record.progress, 40);
    assert!(record.updated_at >= record.created_at);
    record.status = JobStatus::Queued;
    assert!(store.update(record).await.is_err());
}

#[tokio::test]
async fn test_clones_share_records() {
    let store = InMemoryJobStore::new();
    let view = store.clone();
    let id = store.create(JobRecord::new(request("cove"))).await.unwrap();
    assert_eq!(view.get(id).await.unwrap().id, id);
}

#[tokio::test]
async fn test_runner_completes_job() {
    let coordinator =
        StoryPipelineCoordinator::new(Arc::new(StoryDriver::new()), fast_config(4)).unwrap();
    let store = Arc::new(InMemoryJobStore::new());
    let runner = StoryJobRunner::new(Arc::new(coordinator), Arc::clone(&store));

    let ticket = runner.submit(request("tranquil forest")).await.unwrap();
    let id = ticket.finished().await;

    let record = runner.store().get(id).await.unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert!(record.error.is_none());
    let result = record.result.unwrap();
    assert_eq!(result.metrics.beats_generated, 4);
    assert!(!result.story_text.is_empty());
}

#[tokio::test]
async fn test_runner_completes_degraded_job_when_model_is_down() {
    let coordinator =
        StoryPipelineCoordinator::new(Arc::new(FailingDriver::default()), fast_config(2))
            .unwrap();
    let store = Arc::new(InMemoryJobStore::new());
    let runner = StoryJobRunner::new(Arc::new(coordinator), store);

    let id = runner.submit(request("quiet lake")).await.unwrap().finished().await;

    let record = runner.store().get(id).await.unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.result.unwrap().metrics.degraded_beats, vec![0, 1]);
}

#[tokio::test]
async fn test_concurrent_jobs_are_tracked_separately() {
    let coordinator =
        StoryPipelineCoordinator::new(Arc::new(StoryDriver::new()), fast_config(2)).unwrap();
    let runner = StoryJobRunner::new(Arc::new(coordinator), Arc::new(InMemoryJobStore::new()));

    let a = runner.submit(request("forest")).await.unwrap();
    let b = runner.submit(request("mountain")).await.unwrap();
    let (a, b) = (a.finished().await, b.finished().await);

    assert_ne!(a, b);
    let records = runner.store().list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == JobStatus::Completed));
}
