//! Shared state of a single render job
//!
//! A [`JobRecord`] is shared between the runner that produces the animation
//! and the service answering status and result requests. The runner is the
//! only writer of terminal status and result; readers fold queued progress
//! into the status when they poll.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use lissajous_core::domain::job::{JobFailure, JobId, JobStatus, Progress};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Failure recorded when a runner goes away without a terminal status
pub const RUNNER_VANISHED: &str = "runner exited without reporting a result";

#[derive(Debug, Default)]
struct RecordState {
    status: JobStatus,
    result: Option<Vec<u8>>,
    completed_at: Option<DateTime<Utc>>,
}

pub struct JobRecord {
    id: JobId,
    created_at: DateTime<Utc>,
    state: Mutex<RecordState>,
    progress: Mutex<mpsc::Receiver<Progress>>,
    cancel: CancellationToken,
    done: watch::Sender<bool>,
}

/// Exclusive right to run a job
///
/// Created together with its record and consumed when a runner starts, so a
/// record is never driven by more than one runner.
pub struct JobTicket {
    record: Arc<JobRecord>,
    reporter: ProgressReporter,
}

/// Producer side of a job's bounded progress queue
#[derive(Debug)]
pub struct ProgressReporter {
    job_id: JobId,
    sender: mpsc::Sender<Progress>,
}

impl JobRecord {
    /// Creates a record and the ticket needed to run it
    ///
    /// `capacity` bounds the progress queue; zero is treated as one.
    pub fn create(id: JobId, capacity: usize) -> (Arc<JobRecord>, JobTicket) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (done, _) = watch::channel(false);

        let record = Arc::new(Self {
            id,
            created_at: Utc::now(),
            state: Mutex::new(RecordState::default()),
            progress: Mutex::new(receiver),
            cancel: CancellationToken::new(),
            done,
        });

        let ticket = JobTicket {
            record: record.clone(),
            reporter: ProgressReporter { job_id: id, sender },
        };

        (record, ticket)
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.lock_state().completed_at
    }

    /// Current status without consuming queued progress
    pub fn status(&self) -> JobStatus {
        self.lock_state().status.clone()
    }

    /// Folds at most one queued progress message into the status and returns it
    ///
    /// Terminal statuses are returned unchanged.
    pub fn poll_status(&self) -> JobStatus {
        let mut state = self.lock_state();
        if state.status.is_terminal() {
            return state.status.clone();
        }

        let next = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv();

        if let Ok(progress) = next {
            state.status = JobStatus::Running(progress);
        }

        state.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.lock_state().status.is_terminal()
    }

    /// Removes the encoded animation, if present
    pub fn take_result(&self) -> Option<Vec<u8>> {
        self.lock_state().result.take()
    }

    /// Asks the runner to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Waits until the runner has released the job
    ///
    /// Status and result are terminal by the time this returns.
    pub async fn wait_for_completion(&self) {
        let mut done = self.done.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = done.wait_for(|finished| *finished).await;
    }

    pub(crate) fn complete(&self, bytes: Vec<u8>) -> bool {
        let mut state = self.lock_state();
        if state.status.is_terminal() {
            return false;
        }

        state.status = JobStatus::Complete;
        state.result = Some(bytes);
        state.completed_at = Some(Utc::now());
        true
    }

    pub(crate) fn fail(&self, failure: JobFailure) -> bool {
        let mut state = self.lock_state();
        if state.status.is_terminal() {
            return false;
        }

        state.status = JobStatus::Failed(failure);
        state.completed_at = Some(Utc::now());
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn drain_progress(&self) -> Vec<Progress> {
        let mut receiver = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }
}

impl std::fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRecord")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("status", &self.status())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl JobTicket {
    pub fn job_id(&self) -> JobId {
        self.record.id
    }

    pub fn record(&self) -> &Arc<JobRecord> {
        &self.record
    }

    pub(crate) fn into_parts(self) -> (Arc<JobRecord>, ProgressReporter) {
        (self.record, self.reporter)
    }
}

impl ProgressReporter {
    /// Queues a progress message without waiting
    ///
    /// Returns `false` when the message was dropped because the queue is full
    /// or nobody is listening anymore.
    pub fn report(&self, progress: Progress) -> bool {
        match self.sender.try_send(progress) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                debug!("Progress queue full for job {}, dropping {}", self.job_id, dropped);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Signals completion of a job when dropped
///
/// If the runner never wrote a terminal status, a failure is recorded first
/// so waiters always observe a terminal record.
pub(crate) struct CompletionGuard {
    record: Arc<JobRecord>,
}

impl CompletionGuard {
    pub(crate) fn new(record: Arc<JobRecord>) -> Self {
        Self { record }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self
            .record
            .fail(JobFailure::Failed(RUNNER_VANISHED.to_string()))
        {
            warn!("Job {} ended without a terminal status", self.record.id);
        }

        self.record.done.send_if_modified(|finished| {
            if *finished {
                return false;
            }
            *finished = true;
            true
        });
    }
}
