//! Interface to the block-location service of the storage layer.
//!
//! The scheduler consumes this once per split at job-planning time to capture
//! a point-in-time snapshot of replica locations; replication changes after
//! planning are deliberately not tracked.

use std::collections::BTreeMap;

use log::debug;

use crate::topology::Host;

/// Location of one data block: the hosts holding a replica, in the order
/// reported by the storage layer, plus the byte range the block covers.
#[derive(Debug, Clone)]
pub struct BlockLocation {
    pub hosts: Vec<Host>,
    pub offset: u64,
    pub length: u64,
}

/// Answers "which hosts hold the blocks of this byte range".
pub trait BlockLocator {
    /// Returns locations for all blocks of `path` overlapping
    /// `[offset, offset + length)`.
    fn locate_blocks(&self, path: &str, offset: u64, length: u64) -> Vec<BlockLocation>;
}

/// Callback fired once a watched path reaches its target replication.
pub type ReplicationCallback = Box<dyn FnOnce(&str) + Send>;

struct FileBlocks {
    block_size: u64,
    length: u64,
    /// Replica hosts per block index.
    replicas: Vec<Vec<Host>>,
}

struct ReplicationWatch {
    path: String,
    target_replicas: usize,
    callback: ReplicationCallback,
}

/// In-memory block-location service used by tests, demos and planning
/// against a known cluster snapshot.
///
/// Replica registration can be observed through
/// [watch_replication](InMemoryBlockLocator::watch_replication): instead of
/// polling until a file reaches its replication factor, the storage side
/// notifies the watcher as soon as the last replica lands.
#[derive(Default)]
pub struct InMemoryBlockLocator {
    files: BTreeMap<String, FileBlocks>,
    watches: Vec<ReplicationWatch>,
}

impl InMemoryBlockLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file of `length` bytes split into blocks of `block_size`,
    /// initially with no replicas.
    pub fn register_file(&mut self, path: &str, length: u64, block_size: u64) {
        assert!(block_size > 0, "block size must be positive");
        let block_count = length.div_ceil(block_size).max(1) as usize;
        self.files.insert(
            path.to_string(),
            FileBlocks {
                block_size,
                length,
                replicas: vec![Vec::new(); block_count],
            },
        );
    }

    /// Records a replica of block `block_index` of `path` on `host` and
    /// fires any replication watch whose target is now reached.
    ///
    /// # Panics
    ///
    /// Panics if the file is not registered or the block index is out of
    /// range, both caller-side bugs in test or demo setup.
    pub fn add_replica(&mut self, path: &str, block_index: usize, host: impl Into<Host>) {
        let host = host.into();
        let file = self.files.get_mut(path).expect("file is not registered");
        let replicas = &mut file.replicas[block_index];
        if !replicas.contains(&host) {
            replicas.push(host);
        }
        self.fire_ready_watches();
    }

    /// Convenience for single-block files and tests: replicates every block
    /// of `path` onto `host`.
    pub fn add_replica_everywhere(&mut self, path: &str, host: impl Into<Host>) {
        let host = host.into();
        let file = self.files.get_mut(path).expect("file is not registered");
        for replicas in file.replicas.iter_mut() {
            if !replicas.contains(&host) {
                replicas.push(host.clone());
            }
        }
        self.fire_ready_watches();
    }

    /// Registers a callback fired once every block of `path` has at least
    /// `target_replicas` replicas. Fires immediately if that already holds.
    pub fn watch_replication(&mut self, path: &str, target_replicas: usize, callback: ReplicationCallback) {
        self.watches.push(ReplicationWatch {
            path: path.to_string(),
            target_replicas,
            callback,
        });
        self.fire_ready_watches();
    }

    fn fire_ready_watches(&mut self) {
        let mut remaining = Vec::new();
        for watch in self.watches.drain(..) {
            let ready = self
                .files
                .get(&watch.path)
                .map(|file| file.replicas.iter().all(|r| r.len() >= watch.target_replicas))
                .unwrap_or(false);
            if ready {
                debug!("{} reached replication {}", watch.path, watch.target_replicas);
                (watch.callback)(&watch.path);
            } else {
                remaining.push(watch);
            }
        }
        self.watches = remaining;
    }
}

impl BlockLocator for InMemoryBlockLocator {
    fn locate_blocks(&self, path: &str, offset: u64, length: u64) -> Vec<BlockLocation> {
        let Some(file) = self.files.get(path) else {
            return Vec::new();
        };
        let end = offset.saturating_add(length).min(file.length);
        let mut locations = Vec::new();
        for (index, replicas) in file.replicas.iter().enumerate() {
            let block_offset = index as u64 * file.block_size;
            let block_length = file.length.saturating_sub(block_offset).min(file.block_size);
            if block_offset + block_length <= offset || block_offset >= end {
                continue;
            }
            locations.push(BlockLocation {
                hosts: replicas.clone(),
                offset: block_offset,
                length: block_length,
            });
        }
        locations
    }
}
