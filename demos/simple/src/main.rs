use std::{io::Write, path::PathBuf, sync::Arc};

use clap::Parser;
use env_logger::Builder;
use log::info;

use taskrack_cluster::{
    block_location::InMemoryBlockLocator,
    config::ClusterConfig,
    topology::ClusterTopology,
};
use taskrack_scheduler::{
    counters::CounterPolicy,
    job::JobRegistry,
    split::{InputFile, NonSplittableFiles, SplitSource},
};

/// Plans a three-file job on a two-rack cluster and drives one worker
/// through the assignment engine, printing the locality counters.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the cluster description.
    #[arg(short, long, default_value = "demos/simple/cluster.yaml")]
    cluster: PathBuf,

    /// Host the single worker runs on.
    #[arg(short, long, default_value = "host1.rack2.com")]
    worker: String,
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let config: ClusterConfig =
        serde_yaml::from_str(&std::fs::read_to_string(&args.cluster).expect("Can't read cluster file"))
            .expect("Can't parse cluster file");
    let topology = Arc::new(ClusterTopology::from_config(&config));

    // file1 is written while only rack1 exists and keeps replication 1;
    // file2 and file3 are replicated onto every data host.
    let mut locator = InMemoryBlockLocator::new();
    locator.register_file("/racktesting/file1", 10, 128);
    locator.register_file("/racktesting/file2", 10, 128);
    locator.register_file("/racktesting/file3", 10, 128);
    locator.watch_replication(
        "/racktesting/file2",
        3,
        Box::new(|path| info!("{} reached its replication factor", path)),
    );
    locator.add_replica("/racktesting/file1", 0, "host1.rack1.com");
    for path in ["/racktesting/file2", "/racktesting/file3"] {
        for host in ["host1.rack1.com", "host1.rack2.com", "host2.rack2.com"] {
            locator.add_replica(path, 0, host);
        }
    }

    let files = vec![
        InputFile::new("/racktesting/file1", 10),
        InputFile::new("/racktesting/file2", 10),
        InputFile::new("/racktesting/file3", 10),
    ];
    let splits = NonSplittableFiles::new(&locator, files)
        .split_into(3)
        .expect("Can't plan splits");

    let registry = JobRegistry::new();
    let job_id = registry
        .submit(splits, topology, CounterPolicy::default())
        .expect("Can't submit job");
    let job = registry.job(job_id).expect("job was just submitted");

    while let Some(assignment) = job.request_task(&args.worker).expect("request failed") {
        info!(
            "task {} (split {}) -> {} [{:?}]",
            assignment.task, assignment.split, assignment.worker, assignment.locality
        );
        job.complete_task(assignment.task).expect("task was just assigned");
    }

    let counters = job.counters().expect("counters");
    println!("{}", serde_yaml::to_string(&counters).unwrap());
}
