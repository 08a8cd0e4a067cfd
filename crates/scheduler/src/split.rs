//! Input splits and the sources that produce them at planning time.

use itertools::Itertools;
use log::debug;

use taskrack_cluster::block_location::BlockLocator;
use taskrack_cluster::topology::Host;

use crate::error::{SchedulerError, SchedulerResult};

pub type JobId = u64;
pub type SplitId = u64;
pub type TaskId = u64;

/// One contiguous logical unit of input, processed by exactly one task.
///
/// `locations` is the ordered replica host list captured from the
/// block-location service when the job was planned; it may be empty when no
/// location is known and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct InputSplit {
    pub id: SplitId,
    pub locations: Vec<Host>,
}

impl InputSplit {
    pub fn new(id: SplitId, locations: Vec<Host>) -> Self {
        InputSplit { id, locations }
    }
}

/// A file the planner should turn into splits.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub path: String,
    pub length: u64,
}

impl InputFile {
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        InputFile {
            path: path.into(),
            length,
        }
    }
}

/// Produces the splits of a job's input. The planning layer calls this once;
/// the assignment engine is agnostic to how splits were produced.
pub trait SplitSource {
    /// Splits the input into around `target_count` splits. The target is a
    /// hint; sources whose split boundaries are fixed by the data, such as
    /// [NonSplittableFiles] and [BlockSplits], ignore it.
    fn split_into(&self, target_count: usize) -> SchedulerResult<Vec<InputSplit>>;
}

/// One split per file, regardless of the requested split count. Used for
/// formats which cannot be split mid-file; the split inherits the replica
/// locations of the file's first block.
pub struct NonSplittableFiles<'a> {
    locator: &'a dyn BlockLocator,
    files: Vec<InputFile>,
}

impl<'a> NonSplittableFiles<'a> {
    pub fn new(locator: &'a dyn BlockLocator, files: Vec<InputFile>) -> Self {
        NonSplittableFiles { locator, files }
    }
}

impl SplitSource for NonSplittableFiles<'_> {
    fn split_into(&self, _target_count: usize) -> SchedulerResult<Vec<InputSplit>> {
        if self.files.is_empty() {
            return Err(SchedulerError::Planning("no input files".to_string()));
        }
        let mut splits = Vec::with_capacity(self.files.len());
        for (id, file) in self.files.iter().enumerate() {
            let blocks = self.locator.locate_blocks(&file.path, 0, file.length);
            let locations = blocks
                .first()
                .map(|block| block.hosts.iter().cloned().unique().collect())
                .unwrap_or_default();
            debug!("split {} <- {} at {:?}", id, file.path, locations);
            splits.push(InputSplit::new(id as SplitId, locations));
        }
        Ok(splits)
    }
}

/// Strictly one split per data block of each file, regardless of the
/// requested split count; block boundaries already give the finest
/// locality-preserving granularity.
pub struct BlockSplits<'a> {
    locator: &'a dyn BlockLocator,
    files: Vec<InputFile>,
}

impl<'a> BlockSplits<'a> {
    pub fn new(locator: &'a dyn BlockLocator, files: Vec<InputFile>) -> Self {
        BlockSplits { locator, files }
    }
}

impl SplitSource for BlockSplits<'_> {
    fn split_into(&self, _target_count: usize) -> SchedulerResult<Vec<InputSplit>> {
        if self.files.is_empty() {
            return Err(SchedulerError::Planning("no input files".to_string()));
        }
        let mut splits = Vec::new();
        for file in self.files.iter() {
            for block in self.locator.locate_blocks(&file.path, 0, file.length) {
                let locations = block.hosts.iter().cloned().unique().collect::<Vec<_>>();
                debug!(
                    "split {} <- {} [{}; {}) at {:?}",
                    splits.len(),
                    file.path,
                    block.offset,
                    block.offset + block.length,
                    locations
                );
                splits.push(InputSplit::new(splits.len() as SplitId, locations));
            }
        }
        Ok(splits)
    }
}
