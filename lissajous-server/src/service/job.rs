//! Job Service
//!
//! Business logic for render jobs: submission, status polling, one-shot
//! result retrieval and cancellation.

use std::sync::Arc;

use lissajous_core::domain::job::{JobId, JobStatus};
use lissajous_core::dto::job::{JobStatusView, RenderForm, ValidationError};
use lissajous_runner::{JobRecord, JobRunner};
use thiserror::Error;

use crate::repository::job_repository::JobRepository;

/// Service error type
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("encoder is not available on this server")]
    EncoderUnavailable,

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {0} is not complete")]
    NotComplete(JobId),

    #[error("job {0} has already finished")]
    AlreadyFinished(JobId),

    #[error("{0}")]
    Internal(String),
}

#[derive(Clone)]
pub struct JobService {
    jobs: Arc<JobRepository>,
    runner: JobRunner,
    encoder_available: bool,
}

impl JobService {
    /// Creates a service with an empty registry
    ///
    /// `encoder_available` is the result of the encoder probe at startup; when
    /// false every submission is rejected.
    pub fn new(runner: JobRunner, encoder_available: bool) -> Self {
        Self {
            jobs: Arc::new(JobRepository::new()),
            runner,
            encoder_available,
        }
    }

    /// Validates the form and starts a render job
    ///
    /// Returns as soon as the job is registered; rendering happens on a
    /// background task.
    pub fn submit(&self, form: RenderForm) -> Result<JobId, JobError> {
        let params = form.into_params()?;

        if !self.encoder_available {
            return Err(JobError::EncoderUnavailable);
        }

        let id = JobId::new();
        let (record, ticket) = JobRecord::create(id, self.runner.config().progress_capacity);
        self.jobs
            .create(record)
            .map_err(|e| JobError::Internal(e.to_string()))?;

        tracing::info!(
            "Job created: {} (size={}, fps={}, cycles={})",
            id,
            params.size,
            params.fps,
            params.cycles
        );

        self.runner.spawn(ticket, params);

        Ok(id)
    }

    /// Current status, folding in at most one queued progress message
    pub fn poll(&self, id: JobId) -> Result<JobStatusView, JobError> {
        let record = self.find(id)?;
        let status = record.poll_status();
        Ok(JobStatusView::from(&status))
    }

    /// Returns the encoded animation and forgets the job
    ///
    /// Succeeds at most once per job.
    pub fn fetch_result(&self, id: JobId) -> Result<Vec<u8>, JobError> {
        let record = self.find(id)?;
        if record.status() != JobStatus::Complete {
            return Err(JobError::NotComplete(id));
        }

        let record = self.jobs.remove(id).ok_or(JobError::NotFound(id))?;
        let bytes = record
            .take_result()
            .ok_or_else(|| JobError::Internal(format!("job {} has no result", id)))?;

        tracing::info!("Result of job {} retrieved ({} bytes)", id, bytes.len());

        Ok(bytes)
    }

    /// Requests cancellation of a running job
    pub fn cancel(&self, id: JobId) -> Result<(), JobError> {
        let record = self.find(id)?;
        if record.is_finished() {
            return Err(JobError::AlreadyFinished(id));
        }

        record.cancel();
        tracing::info!("Cancellation requested for job {}", id);

        Ok(())
    }

    /// Cancels every unfinished job, returning how many were signalled
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for record in self.jobs.list() {
            if !record.is_finished() && !record.is_cancelled() {
                record.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Waits until every registered job has released its resources
    pub async fn wait_for_all(&self) {
        for record in self.jobs.list() {
            record.wait_for_completion().await;
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn find(&self, id: JobId) -> Result<Arc<JobRecord>, JobError> {
        self.jobs.find_by_id(id).ok_or(JobError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, BlockingEncoder, FakeEncoder};
    use std::time::Duration;

    fn form(frames: &str) -> RenderForm {
        RenderForm {
            cycles: Some("1".to_string()),
            res: Some("0.1".to_string()),
            size: Some("2".to_string()),
            frames: Some(frames.to_string()),
            ..Default::default()
        }
    }

    async fn wait_until_finished(service: &JobService, id: JobId) {
        let record = service.find(id).unwrap();
        tokio::time::timeout(Duration::from_secs(10), record.wait_for_completion())
            .await
            .expect("job should finish");
    }

    #[tokio::test]
    async fn test_submit_poll_fetch() {
        let (service, _root) = testing::service(FakeEncoder);

        let id = service.submit(form("4")).unwrap();
        let first = service.poll(id).unwrap();
        assert!(!first.is_error());

        wait_until_finished(&service, id).await;

        let view = service.poll(id).unwrap();
        assert!(view.is_complete());
        assert_eq!(view.error, None);

        let bytes = service.fetch_result(id).unwrap();
        assert_eq!(bytes, testing::FAKE_WEBP);

        assert!(matches!(service.fetch_result(id), Err(JobError::NotFound(_))));
        assert!(matches!(service.poll(id), Err(JobError::NotFound(_))));
        assert_eq!(service.job_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_submission_creates_no_job() {
        let (service, _root) = testing::service(FakeEncoder);

        let err = service
            .submit(RenderForm {
                fg_color: Some("not-a-color".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, JobError::Validation(_)));

        let err = service.submit(form("500")).unwrap_err();
        assert!(matches!(err, JobError::Validation(_)));

        assert_eq!(service.job_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_encoder_rejects_submissions() {
        let (service, _root) = testing::service_with(FakeEncoder, false);
        assert!(matches!(
            service.submit(form("4")),
            Err(JobError::EncoderUnavailable)
        ));
        assert_eq!(service.job_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_before_complete() {
        let (service, _root) = testing::service(BlockingEncoder);

        let id = service.submit(form("4")).unwrap();
        assert!(matches!(
            service.fetch_result(id),
            Err(JobError::NotComplete(_))
        ));
        // Still registered after a premature fetch
        assert!(service.poll(id).is_ok());

        service.cancel(id).unwrap();
        wait_until_finished(&service, id).await;
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (service, _root) = testing::service(FakeEncoder);
        let id = JobId::new();
        assert!(matches!(service.poll(id), Err(JobError::NotFound(_))));
        assert!(matches!(service.fetch_result(id), Err(JobError::NotFound(_))));
        assert!(matches!(service.cancel(id), Err(JobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_reports_error_status() {
        let (service, _root) = testing::service(BlockingEncoder);

        let id = service.submit(form("4")).unwrap();
        service.cancel(id).unwrap();
        wait_until_finished(&service, id).await;

        let view = service.poll(id).unwrap();
        assert!(view.is_error());
        assert_eq!(view.error.as_deref(), Some("job was cancelled"));

        assert!(matches!(
            service.cancel(id),
            Err(JobError::AlreadyFinished(_))
        ));
        assert!(matches!(
            service.fetch_result(id),
            Err(JobError::NotComplete(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_fetch_succeeds_once() {
        let (service, _root) = testing::service(FakeEncoder);

        let id = service.submit(form("2")).unwrap();
        wait_until_finished(&service, id).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.fetch_result(id) })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(bytes) => {
                    assert_eq!(bytes, testing::FAKE_WEBP);
                    successes += 1;
                }
                Err(e) => assert!(matches!(e, JobError::NotFound(_))),
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (service, _root) = testing::service(BlockingEncoder);

        service.submit(form("2")).unwrap();
        service.submit(form("2")).unwrap();

        assert_eq!(service.cancel_all(), 2);
        tokio::time::timeout(Duration::from_secs(10), service.wait_for_all())
            .await
            .expect("jobs should finish");
        assert_eq!(service.cancel_all(), 0);
    }
}
