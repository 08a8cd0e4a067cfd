use std::sync::PoisonError;

use thiserror::Error;

use crate::split::{JobId, TaskId};
use crate::task::TaskState;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Caller-side programming bug, e.g. an empty worker host string.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("job {0} does not exist")]
    UnknownJob(JobId),
    #[error("task {0} does not exist")]
    UnknownTask(TaskId),
    /// A task transition from a state it is not in, e.g. re-inserting a task
    /// that is already pending. Indicates a bug in the caller's liveness
    /// monitor and must not be silently ignored.
    #[error("inconsistent state for task {task}: expected {expected:?}, found {actual:?}")]
    InconsistentTaskState {
        task: TaskId,
        expected: TaskState,
        actual: TaskState,
    },
    #[error("planning failed: {0}")]
    Planning(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl<T> From<PoisonError<T>> for SchedulerError {
    fn from(error: PoisonError<T>) -> Self {
        SchedulerError::Internal(error.to_string())
    }
}
