//! Preferred hosts and racks of a split, used for locality tiering.

use itertools::Itertools;

use taskrack_cluster::topology::{ClusterTopology, Host, Rack};

use crate::split::InputSplit;

/// Candidate placement targets of one split, computed once at task-creation
/// time and cached on the task (replica locations do not change mid-job).
#[derive(Debug, Clone, Default)]
pub struct TaskCandidates {
    /// Hosts holding a replica, deduplicated, in replica-list order.
    pub preferred_hosts: Vec<Host>,
    /// Racks of the preferred hosts, deduplicated.
    pub preferred_racks: Vec<Rack>,
}

impl TaskCandidates {
    /// Expands the split's replica host list into preferred hosts and the
    /// racks those hosts belong to. Hosts the topology does not know land in
    /// the default rack, so this never fails.
    pub fn build(split: &InputSplit, topology: &ClusterTopology) -> Self {
        let preferred_hosts: Vec<Host> = split.locations.iter().cloned().unique().collect();
        let preferred_racks: Vec<Rack> = preferred_hosts
            .iter()
            .map(|host| topology.rack_of(host).to_string())
            .unique()
            .collect();
        TaskCandidates {
            preferred_hosts,
            preferred_racks,
        }
    }
}
