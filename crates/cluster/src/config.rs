use serde::{Deserialize, Serialize};

/// One rack with its hosts.
#[derive(Serialize, Deserialize)]
pub struct RackConfig {
    pub name: String,
    pub hosts: Vec<String>,
}

/// Static cluster description, usually loaded from YAML.
#[derive(Serialize, Deserialize)]
pub struct ClusterConfig {
    pub racks: Vec<RackConfig>,
}
