use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;

use cloverleaf::config::{Config, DEFAULT_DECK};
use cloverleaf::error::Result;
use cloverleaf::solvers::run_workers;

#[derive(Debug, Parser)]
#[clap(version, about = "Explicit Lagrangian-Eulerian hydrodynamics on a structured 2D mesh")]
struct Opts {
    /// Input deck; the built-in test problem is used if the file is absent
    #[clap(short, long, default_value = "clover.in")]
    input: PathBuf,

    /// Number of chunks, each run by its own worker thread
    #[clap(short, long, default_value = "1")]
    workers: usize,

    /// Size of the thread pool the tiles run on (0 for one per core)
    #[clap(short, long, default_value = "0")]
    threads: usize,

    /// Directory visit snapshots are written to
    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// One of off, error, warn, info, debug, trace
    #[clap(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn read_config(path: &Path) -> Result<Config> {
    if path.exists() {
        info!("Reading input deck {}", path.display());
        Config::from_file(path)
    } else {
        warn!("{} not found, running the built-in test problem", path.display());
        DEFAULT_DECK.parse()
    }
}

fn run(opts: &Opts) -> Result<()> {
    if opts.threads != 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(opts.threads).build_global() {
            warn!("could not size the thread pool: {}", e);
        }
    }
    let config = read_config(&opts.input)?;
    let report = run_workers(&config, opts.workers, &opts.output_dir)?;

    info!(
        "Finished {} steps at t={:.7} in {:.2}s",
        report.steps,
        report.time,
        report.wall_clock.as_secs_f64()
    );
    Ok(())
}

fn main() {
    let opts = Opts::parse();

    if let Err(e) = SimpleLogger::new().with_level(opts.log_level).init() {
        eprintln!("{}", e);
    }
    info!("Clover version {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&opts) {
        error!("{}", e);
        std::process::exit(1);
    }
}
