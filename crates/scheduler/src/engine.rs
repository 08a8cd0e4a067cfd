//! The task assignment engine.
//!
//! A [JobContext] owns all mutable scheduling state of one job behind a
//! per-job lock: the three indexes over pending tasks (by preferred host, by
//! preferred rack, and the unindexed fallback pool), the task state machine
//! and the locality counters. Worker-request events from many threads
//! serialize on that lock only for the duration of one pick-and-remove;
//! concurrently scheduling jobs share nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use log::debug;

use taskrack_cluster::topology::{ClusterTopology, Host, Rack};

use crate::candidate::TaskCandidates;
use crate::counters::{CounterPolicy, CountersSnapshot, Locality, LocalityCounters};
use crate::error::{SchedulerError, SchedulerResult};
use crate::split::{InputSplit, JobId, SplitId, TaskId};
use crate::task::{Task, TaskState};

/// A task bound to a worker, handed to the execution runtime.
#[derive(Debug, Clone)]
pub struct TaskAssignment {
    pub task: TaskId,
    pub split: SplitId,
    pub worker: Host,
    pub locality: Locality,
}

struct EngineCore {
    tasks: Vec<Task>,
    /// Pending tasks under every host in their preferred-host set.
    by_host: BTreeMap<Host, BTreeSet<TaskId>>,
    /// Pending tasks under every rack in their preferred-rack set.
    by_rack: BTreeMap<Rack, BTreeSet<TaskId>>,
    /// Every pending task, the off-rack fallback pool.
    unindexed: BTreeSet<TaskId>,
    counters: LocalityCounters,
    shut_down: bool,
}

impl EngineCore {
    fn task(&self, task_id: TaskId) -> SchedulerResult<&Task> {
        self.tasks
            .get(task_id as usize)
            .ok_or(SchedulerError::UnknownTask(task_id))
    }

    fn index_task(&mut self, task_id: TaskId) {
        let task = &self.tasks[task_id as usize];
        for host in task.candidates.preferred_hosts.iter() {
            self.by_host.entry(host.clone()).or_default().insert(task_id);
        }
        for rack in task.candidates.preferred_racks.iter() {
            self.by_rack.entry(rack.clone()).or_default().insert(task_id);
        }
        self.unindexed.insert(task_id);
    }

    /// Removes the task from all three indexes. Claiming a task must make it
    /// vanish everywhere at once, otherwise a task indexed under several
    /// hosts or racks could be handed out twice.
    fn deindex_task(&mut self, task_id: TaskId) {
        let task = &self.tasks[task_id as usize];
        for host in task.candidates.preferred_hosts.iter() {
            if let Some(tasks) = self.by_host.get_mut(host) {
                tasks.remove(&task_id);
                if tasks.is_empty() {
                    self.by_host.remove(host);
                }
            }
        }
        for rack in task.candidates.preferred_racks.iter() {
            if let Some(tasks) = self.by_rack.get_mut(rack) {
                tasks.remove(&task_id);
                if tasks.is_empty() {
                    self.by_rack.remove(rack);
                }
            }
        }
        self.unindexed.remove(&task_id);
    }

    /// Picks the pending task for `worker_host` by locality tier. The
    /// tie-break within a tier is the lowest task id (creation order), so
    /// placement is deterministic; the tier always dominates any other
    /// ordering.
    fn pick(&self, worker_host: &str, rack: &str) -> Option<(TaskId, Locality)> {
        if let Some(task_id) = self.by_host.get(worker_host).and_then(|tasks| tasks.first()) {
            return Some((*task_id, Locality::DataLocal));
        }
        if let Some(task_id) = self.by_rack.get(rack).and_then(|tasks| tasks.first()) {
            return Some((*task_id, Locality::RackLocal));
        }
        self.unindexed.first().map(|task_id| (*task_id, Locality::OffRack))
    }

    /// Puts a running task back into the pending indexes. The caller must
    /// have checked that the task is running.
    fn reinsert(&mut self, task_id: TaskId, counter_policy: CounterPolicy) {
        if counter_policy == CounterPolicy::Correcting {
            if let Some(locality) = self.tasks[task_id as usize].last_locality.take() {
                self.counters.unrecord(locality);
            }
        }
        let task = &mut self.tasks[task_id as usize];
        task.state = TaskState::Pending;
        task.worker = None;
        self.index_task(task_id);
    }
}

/// Scheduling context of one job. Cheap to share (`Arc`) between the worker
/// event loop, the liveness monitor and the reporting layer.
pub struct JobContext {
    id: JobId,
    /// Point-in-time topology snapshot; locality decisions of this job do
    /// not follow topology changes made after planning.
    topology: Arc<ClusterTopology>,
    counter_policy: CounterPolicy,
    core: Mutex<EngineCore>,
}

impl JobContext {
    /// Plans one task per split, computing and caching the candidate sets
    /// from the topology snapshot, and starts with every task pending.
    pub fn new(
        id: JobId,
        splits: Vec<InputSplit>,
        topology: Arc<ClusterTopology>,
        counter_policy: CounterPolicy,
    ) -> Self {
        let tasks = splits
            .into_iter()
            .enumerate()
            .map(|(task_id, split)| {
                let candidates = TaskCandidates::build(&split, &topology);
                Task::new(task_id as TaskId, split, candidates)
            })
            .collect::<Vec<_>>();
        let mut core = EngineCore {
            tasks,
            by_host: BTreeMap::new(),
            by_rack: BTreeMap::new(),
            unindexed: BTreeSet::new(),
            counters: LocalityCounters::new(),
            shut_down: false,
        };
        for task_id in 0..core.tasks.len() as TaskId {
            core.index_task(task_id);
        }
        JobContext {
            id,
            topology,
            counter_policy,
            core: Mutex::new(core),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Selects a task for an idle worker on `worker_host`, preferring
    /// data-local over rack-local over off-rack placement.
    ///
    /// Returns `Ok(None)` when no pending work is left or the job was shut
    /// down; the caller's scheduling loop decides what the worker does then.
    /// An empty worker host is a caller bug and fails fast. A worker host
    /// unknown to the topology competes in the default rack for the
    /// rack-local tier; the data-local tier works directly off host identity.
    pub fn request_task(&self, worker_host: &str) -> SchedulerResult<Option<TaskAssignment>> {
        if worker_host.is_empty() {
            return Err(SchedulerError::InvalidRequest("empty worker host".to_string()));
        }
        let rack = self.topology.rack_of(worker_host).to_string();
        let mut core = self.core.lock()?;
        if core.shut_down {
            return Ok(None);
        }
        let Some((task_id, locality)) = core.pick(worker_host, &rack) else {
            return Ok(None);
        };
        core.deindex_task(task_id);
        core.counters.record(locality);
        let task = &mut core.tasks[task_id as usize];
        task.state = TaskState::Running;
        task.worker = Some(worker_host.to_string());
        task.last_locality = Some(locality);
        let assignment = TaskAssignment {
            task: task_id,
            split: task.split.id,
            worker: worker_host.to_string(),
            locality,
        };
        debug!(
            "job {}: assigned task {} (split {}) to {} as {:?}",
            self.id, task_id, assignment.split, worker_host, locality
        );
        Ok(Some(assignment))
    }

    /// Re-inserts a running task into the pending indexes, typically after
    /// the liveness monitor declared its worker lost. The task becomes
    /// eligible again under the same tiering rules.
    pub fn release_task(&self, task_id: TaskId) -> SchedulerResult<()> {
        let mut core = self.core.lock()?;
        let task = core.task(task_id)?;
        if task.state != TaskState::Running {
            return Err(SchedulerError::InconsistentTaskState {
                task: task_id,
                expected: TaskState::Running,
                actual: task.state,
            });
        }
        core.reinsert(task_id, self.counter_policy);
        debug!("job {}: task {} released back to pending", self.id, task_id);
        Ok(())
    }

    /// Re-inserts every running task bound to `worker_host` (worker-lost
    /// event from the membership layer). Returns the re-inserted task ids.
    ///
    /// Collecting and re-inserting happen under one lock acquisition, so a
    /// completion or duplicate worker-lost event racing with this call can
    /// never strand part of the worker's tasks in the running state.
    pub fn release_worker_tasks(&self, worker_host: &str) -> SchedulerResult<Vec<TaskId>> {
        if worker_host.is_empty() {
            return Err(SchedulerError::InvalidRequest("empty worker host".to_string()));
        }
        let mut core = self.core.lock()?;
        let running = core
            .tasks
            .iter()
            .filter(|task| {
                task.state == TaskState::Running && task.worker.as_deref() == Some(worker_host)
            })
            .map(|task| task.id)
            .collect::<Vec<_>>();
        for &task_id in running.iter() {
            core.reinsert(task_id, self.counter_policy);
            debug!("job {}: task {} released back to pending", self.id, task_id);
        }
        Ok(running)
    }

    /// Marks a running task as done.
    pub fn complete_task(&self, task_id: TaskId) -> SchedulerResult<()> {
        self.finish_task(task_id, TaskState::Done)
    }

    /// Marks a running task as failed. Whether and how it is retried is the
    /// caller's policy; `release_task` is not called implicitly.
    pub fn fail_task(&self, task_id: TaskId) -> SchedulerResult<()> {
        self.finish_task(task_id, TaskState::Failed)
    }

    fn finish_task(&self, task_id: TaskId, target: TaskState) -> SchedulerResult<()> {
        let mut core = self.core.lock()?;
        let task = core.task(task_id)?;
        if task.state != TaskState::Running {
            return Err(SchedulerError::InconsistentTaskState {
                task: task_id,
                expected: TaskState::Running,
                actual: task.state,
            });
        }
        core.tasks[task_id as usize].state = target;
        Ok(())
    }

    /// Current state of a task, for progress reporting.
    pub fn task_state(&self, task_id: TaskId) -> SchedulerResult<TaskState> {
        let core = self.core.lock()?;
        Ok(core.task(task_id)?.state)
    }

    /// Snapshot of the locality counters.
    pub fn counters(&self) -> SchedulerResult<CountersSnapshot> {
        let core = self.core.lock()?;
        Ok(core.counters.snapshot())
    }

    /// Number of pending tasks.
    pub fn pending_tasks(&self) -> SchedulerResult<usize> {
        let core = self.core.lock()?;
        Ok(core.unindexed.len())
    }

    /// Whether every task of the job left the pending pool.
    pub fn is_drained(&self) -> SchedulerResult<bool> {
        Ok(self.pending_tasks()? == 0)
    }

    /// Stops handing out tasks immediately: every subsequent `request_task`
    /// returns `Ok(None)`. Running tasks are unaffected; assignment is the
    /// terminal engine action, so nothing needs rollback.
    pub fn shutdown(&self) -> SchedulerResult<()> {
        let mut core = self.core.lock()?;
        core.shut_down = true;
        debug!("job {}: shut down, no more tasks will be handed out", self.id);
        Ok(())
    }
}
