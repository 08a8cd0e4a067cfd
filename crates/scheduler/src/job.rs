//! Multi-job front door used by the job coordination service.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use log::debug;

use taskrack_cluster::topology::ClusterTopology;

use crate::counters::{CounterPolicy, CountersSnapshot};
use crate::engine::{JobContext, TaskAssignment};
use crate::error::{SchedulerError, SchedulerResult};
use crate::split::{InputSplit, JobId, TaskId};
use crate::task::TaskState;

/// Owns the scheduling contexts of all live jobs. The registry lock guards
/// only the job map; each job carries its own lock, so concurrently
/// scheduling jobs never contend with each other.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<BTreeMap<JobId, Arc<JobContext>>>,
    next_job_id: Mutex<JobId>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans a job from its splits against a topology snapshot and registers
    /// its scheduling context. Returns the new job id.
    pub fn submit(
        &self,
        splits: Vec<InputSplit>,
        topology: Arc<ClusterTopology>,
        counter_policy: CounterPolicy,
    ) -> SchedulerResult<JobId> {
        let job_id = {
            let mut next = self.next_job_id.lock()?;
            let id = *next;
            *next += 1;
            id
        };
        let context = Arc::new(JobContext::new(job_id, splits, topology, counter_policy));
        debug!("registered job {}", job_id);
        self.jobs.lock()?.insert(job_id, context);
        Ok(job_id)
    }

    /// Returns the scheduling context of `job_id`.
    pub fn job(&self, job_id: JobId) -> SchedulerResult<Arc<JobContext>> {
        self.jobs
            .lock()?
            .get(&job_id)
            .cloned()
            .ok_or(SchedulerError::UnknownJob(job_id))
    }

    /// Convenience passthrough to [JobContext::request_task].
    pub fn request_task(&self, job_id: JobId, worker_host: &str) -> SchedulerResult<Option<TaskAssignment>> {
        self.job(job_id)?.request_task(worker_host)
    }

    /// Convenience passthrough to [JobContext::counters].
    pub fn counters(&self, job_id: JobId) -> SchedulerResult<CountersSnapshot> {
        self.job(job_id)?.counters()
    }

    /// Convenience passthrough to [JobContext::task_state].
    pub fn task_state(&self, job_id: JobId, task_id: TaskId) -> SchedulerResult<TaskState> {
        self.job(job_id)?.task_state(task_id)
    }

    /// Re-inserts all running tasks of a lost worker, across every job.
    pub fn worker_lost(&self, worker_host: &str) -> SchedulerResult<usize> {
        let contexts = self.jobs.lock()?.values().cloned().collect::<Vec<_>>();
        let mut released = 0;
        for context in contexts {
            released += context.release_worker_tasks(worker_host)?.len();
        }
        Ok(released)
    }

    /// Shuts a job down and drops it from the registry. Workers already
    /// waiting get `Ok(None)` from the shared context.
    pub fn remove(&self, job_id: JobId) -> SchedulerResult<()> {
        let context = self
            .jobs
            .lock()?
            .remove(&job_id)
            .ok_or(SchedulerError::UnknownJob(job_id))?;
        context.shutdown()?;
        debug!("removed job {}", job_id);
        Ok(())
    }
}
