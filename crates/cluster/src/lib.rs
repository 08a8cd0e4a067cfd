//! Cluster-side inputs for rack-aware task placement: the host/rack topology
//! model, the cluster config it is built from, and the block-location service
//! interface used to snapshot replica locations at job-planning time.

pub mod block_location;
pub mod config;
pub mod topology;
