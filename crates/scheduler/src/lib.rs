//! Data-locality-aware task placement for a batch job scheduler.
//!
//! A job is planned from input splits whose replica locations are captured
//! from the block-location service at planning time. When a worker asks for
//! work, the assignment engine hands out a pending task by locality tier:
//! a task whose data is on the worker's host (data-local), failing that one
//! with a replica in the worker's rack (rack-local), and only otherwise any
//! remaining task (off-rack). Per-job locality counters make the placement
//! quality observable.

pub mod candidate;
pub mod counters;
pub mod engine;
pub mod error;
pub mod job;
pub mod split;
pub mod task;
