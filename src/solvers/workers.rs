use std::path::Path;
use std::thread;

use log::{error, info};

use super::clover::{Clover, RunReport};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::message::{Communicator, LocalCommunicator};

/// Run a problem on `workers` threads, one chunk each, connected by an
/// in-process communicator. Returns the boss worker's report. If any worker
/// fails, the others are woken with an abort and the first genuine error is
/// returned.
///
pub fn run_workers(config: &Config, workers: usize, output_dir: &Path) -> Result<RunReport> {
    if workers == 0 {
        return Err(Error::InvalidConfiguration("at least one worker is needed".into()));
    }
    info!("Running on {} worker threads", workers);

    let handles = LocalCommunicator::group(workers)
        .into_iter()
        .map(|comm| {
            let config = config.clone();
            let output_dir = output_dir.to_path_buf();
            thread::Builder::new()
                .name(format!("clover-{}", comm.rank()))
                .spawn(move || run_worker(config, comm, output_dir))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    let mut reports = Vec::new();
    let mut errors = Vec::new();

    for (rank, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => errors.push(e),
            Err(_) => errors.push(Error::Transport(format!("worker {} panicked", rank))),
        }
    }

    if !errors.is_empty() {
        let first = errors
            .iter()
            .position(|e| !matches!(e, Error::PeerAborted(_)))
            .unwrap_or(0);
        return Err(errors.swap_remove(first));
    }
    Ok(reports.swap_remove(0))
}

fn run_worker(config: Config, comm: LocalCommunicator, output_dir: std::path::PathBuf) -> Result<RunReport> {
    let result = Clover::with_output_dir(config, &comm, output_dir).and_then(|mut clover| clover.run());

    if let Err(e) = &result {
        if !matches!(e, Error::PeerAborted(_)) {
            error!("[{}] {}", comm.rank(), e);
        }
        comm.abort();
    }
    result
}
