//! Job Repository
//!
//! In-memory registry of live jobs, keyed by job id.
//!
//! The lock is held only for the map operation itself; callers work with the
//! returned records after it has been released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lissajous_core::domain::job::JobId;
use lissajous_runner::JobRecord;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("job {0} is already registered")]
pub struct DuplicateJob(pub JobId);

#[derive(Debug, Default)]
pub struct JobRepository {
    jobs: Mutex<HashMap<JobId, Arc<JobRecord>>>,
}

impl JobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new record
    pub fn create(&self, record: Arc<JobRecord>) -> Result<(), DuplicateJob> {
        let id = record.id();
        let mut jobs = self.lock();
        if jobs.contains_key(&id) {
            return Err(DuplicateJob(id));
        }
        jobs.insert(id, record);
        Ok(())
    }

    /// Find a job by ID
    pub fn find_by_id(&self, id: JobId) -> Option<Arc<JobRecord>> {
        self.lock().get(&id).cloned()
    }

    /// Removes a job, returning it if it was registered
    pub fn remove(&self, id: JobId) -> Option<Arc<JobRecord>> {
        self.lock().remove(&id)
    }

    /// All registered jobs, oldest first
    pub fn list(&self) -> Vec<Arc<JobRecord>> {
        let mut jobs: Vec<_> = self.lock().values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at());
        jobs
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Arc<JobRecord>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
