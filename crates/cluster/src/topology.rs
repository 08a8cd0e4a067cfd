//! Two-level cluster topology: cluster -> racks -> hosts.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::config::ClusterConfig;

/// Opaque host identifier.
pub type Host = String;
/// Opaque rack identifier.
pub type Rack = String;

/// Rack assigned to every host the topology does not know about.
pub const DEFAULT_RACK: &str = "/default-rack";

/// Maps hosts to racks and back. Read-only for the duration of a job's
/// scheduling; mutation happens only between jobs, driven by cluster
/// topology discovery.
#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    rack_by_host: BTreeMap<Host, Rack>,
    hosts_by_rack: BTreeMap<Rack, BTreeSet<Host>>,
}

impl ClusterTopology {
    /// Creates an empty topology where every host resolves to [DEFAULT_RACK].
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds topology from a parsed cluster config.
    pub fn from_config(config: &ClusterConfig) -> Self {
        let mut topology = Self::new();
        for rack in config.racks.iter() {
            for host in rack.hosts.iter() {
                topology.add_host(host.clone(), rack.name.clone());
            }
        }
        topology
    }

    /// Registers `host` in `rack`. A host belongs to exactly one rack,
    /// so re-adding a known host moves it.
    pub fn add_host(&mut self, host: Host, rack: Rack) {
        self.remove_host(&host);
        self.hosts_by_rack.entry(rack.clone()).or_default().insert(host.clone());
        self.rack_by_host.insert(host, rack);
    }

    /// Removes `host` from the topology. Returns the rack it was in, if any.
    pub fn remove_host(&mut self, host: &str) -> Option<Rack> {
        let rack = self.rack_by_host.remove(host)?;
        if let Some(hosts) = self.hosts_by_rack.get_mut(&rack) {
            hosts.remove(host);
            if hosts.is_empty() {
                self.hosts_by_rack.remove(&rack);
            }
        }
        Some(rack)
    }

    /// Returns the rack of `host`. Total: unknown hosts resolve to
    /// [DEFAULT_RACK] so downstream placement is never blocked by a
    /// topology gap. Reporting such gaps is the discovery layer's job,
    /// so this only logs at debug level.
    pub fn rack_of(&self, host: &str) -> &str {
        match self.rack_by_host.get(host) {
            Some(rack) => rack,
            None => {
                debug!("host {} is not in the topology, assuming {}", host, DEFAULT_RACK);
                DEFAULT_RACK
            }
        }
    }

    /// Returns all hosts in `rack`. Diagnostics only, the placement
    /// algorithm does not need it.
    pub fn hosts_of(&self, rack: &str) -> Option<&BTreeSet<Host>> {
        self.hosts_by_rack.get(rack)
    }

    /// Returns all known racks.
    pub fn racks(&self) -> impl Iterator<Item = &Rack> {
        self.hosts_by_rack.keys()
    }

    /// Returns all known hosts.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.rack_by_host.keys()
    }

    /// Whether `host` is known to the topology.
    pub fn contains_host(&self, host: &str) -> bool {
        self.rack_by_host.contains_key(host)
    }

    /// Number of known hosts.
    pub fn len(&self) -> usize {
        self.rack_by_host.len()
    }

    /// Whether the topology has no hosts.
    pub fn is_empty(&self) -> bool {
        self.rack_by_host.is_empty()
    }
}
