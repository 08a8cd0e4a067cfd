//! Locality classification and per-job counters.

use serde::{Deserialize, Serialize};

/// How close an assigned worker is to the task's data. Computed once per
/// assignment, never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locality {
    /// The worker's host holds a replica of the split's data.
    DataLocal,
    /// No replica on the worker's host, but one in its rack.
    RackLocal,
    /// Neither data-local nor rack-local.
    OffRack,
}

/// What happens to the counters when a running task is re-inserted after its
/// worker is lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterPolicy {
    /// Never decrement; a re-assigned task adds a second classification, so
    /// totals count assignments rather than tasks. The default.
    #[default]
    Additive,
    /// Decrement the released task's recorded classification, so totals
    /// track tasks in their current placement.
    Correcting,
}

/// Monotonic per-job locality counters, incremented exactly once per
/// assignment (decrements only under [CounterPolicy::Correcting]).
#[derive(Debug, Default)]
pub struct LocalityCounters {
    data_local: u64,
    rack_local: u64,
    off_rack: u64,
}

impl LocalityCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, locality: Locality) {
        match locality {
            Locality::DataLocal => self.data_local += 1,
            Locality::RackLocal => self.rack_local += 1,
            Locality::OffRack => self.off_rack += 1,
        }
    }

    pub fn unrecord(&mut self, locality: Locality) {
        match locality {
            Locality::DataLocal => self.data_local -= 1,
            Locality::RackLocal => self.rack_local -= 1,
            Locality::OffRack => self.off_rack -= 1,
        }
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            data_local: self.data_local,
            rack_local: self.rack_local,
            off_rack: self.off_rack,
        }
    }
}

/// Point-in-time view of the counters, exposed to the reporting layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountersSnapshot {
    /// Assignments where the worker's host held a replica.
    pub data_local: u64,
    /// Assignments placed in a rack holding a replica.
    pub rack_local: u64,
    /// Assignments with no locality at all.
    pub off_rack: u64,
}

impl CountersSnapshot {
    /// Total number of recorded assignments.
    pub fn total(&self) -> u64 {
        self.data_local + self.rack_local + self.off_rack
    }
}
