//! Task state machine.

use taskrack_cluster::topology::Host;

use crate::candidate::TaskCandidates;
use crate::counters::Locality;
use crate::split::{InputSplit, TaskId};

/// Assignment state of a task.
///
/// The engine moves tasks `Pending -> Running` (assignment) and back
/// (re-insertion after a lost worker); the execution runtime reports
/// `Running -> Done` and `Running -> Failed`. Re-queuing a failed task is a
/// policy decision outside this core, but the state machine admits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Failed,
}

/// One split bound to one job, with its cached candidate sets.
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub split: InputSplit,
    pub candidates: TaskCandidates,
    pub state: TaskState,
    /// Worker the task is (or was last) bound to.
    pub worker: Option<Host>,
    /// Classification of the most recent assignment.
    pub last_locality: Option<Locality>,
}

impl Task {
    pub fn new(id: TaskId, split: InputSplit, candidates: TaskCandidates) -> Self {
        Task {
            id,
            split,
            candidates,
            state: TaskState::Pending,
            worker: None,
            last_locality: None,
        }
    }
}
