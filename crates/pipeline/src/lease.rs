//! In-process exclusion of concurrent runs of the same job.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use synth_core::types::DbId;

/// Set of job ids with a batch run in flight.
#[derive(Debug, Clone, Default)]
pub struct ActiveRuns {
    jobs: Arc<Mutex<HashSet<DbId>>>,
}

impl ActiveRuns {
    /// Claim `job_id`. Returns `None` while another lease for it is alive.
    pub fn try_acquire(&self, job_id: DbId) -> Option<RunLease> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(job_id).then(|| RunLease {
            job_id,
            jobs: Arc::clone(&self.jobs),
        })
    }

    pub fn is_active(&self, job_id: DbId) -> bool {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&job_id)
    }

    /// Number of jobs currently holding a lease.
    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its job id when dropped.
#[derive(Debug)]
pub struct RunLease {
    job_id: DbId,
    jobs: Arc<Mutex<HashSet<DbId>>>,
}

impl RunLease {
    pub fn job_id(&self) -> DbId {
        self.job_id
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job_id);
    }
}
