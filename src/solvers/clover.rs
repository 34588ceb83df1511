use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info};
use rayon::prelude::*;

use crate::chunk::Chunk;
use crate::config::Config;
use crate::decompose::decompose;
use crate::error::{Error, Result};
use crate::field::{FieldId, FieldSet};
use crate::halo::update_halo;
use crate::hydro::accelerate::accelerate;
use crate::hydro::advec_cell::advec_cell;
use crate::hydro::advec_mom::advec_mom;
use crate::hydro::calc_dt::{calc_dt, DtCandidate};
use crate::hydro::flux_calc::flux_calc;
use crate::hydro::generate::{generate_chunk, initialise_chunk};
use crate::hydro::ideal_gas::ideal_gas;
use crate::hydro::pdv::pdv;
use crate::hydro::reset::{reset_field, revert};
use crate::hydro::viscosity::viscosity;
use crate::hydro::G_SMALL;
use crate::index_space::Axis;
use crate::message::util::all_reduce_value;
use crate::message::Communicator;
use crate::profiler::{Phase, Profiler};
use crate::summary::{field_summary, verify, FieldSummary, Verdict};
use crate::visit::Snapshot;

use super::timestep::TimestepLimits;

/// Where a run is in its life cycle.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Init,
    Running,
    Complete,
}

/// Whether a run should keep stepping.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Continue,
    Complete,
}

/// What a finished run hands back to its caller.
///
#[derive(Clone, Debug)]
pub struct RunReport {
    pub steps: u64,
    pub time: f64,
    pub summary: FieldSummary,
    pub verdict: Option<Verdict>,
    pub wall_clock: Duration,
}

/// One worker's share of a hydro run: its chunk of the mesh, the
/// communicator connecting it to the other workers, and the clock.
///
pub struct Clover<C: Communicator> {
    config: Config,
    comm: C,
    chunk: Chunk,
    profiler: Profiler,
    output_dir: PathBuf,
    stage: Stage,
    step: u64,
    time: f64,
    dt: f64,
    dtold: f64,
    advect_x: bool,
    wall_start: Instant,
    first_step: Duration,
    second_step: Duration,
    last_summary: FieldSummary,
    verdict: Option<Verdict>,
}

/// The fields a fresh chunk exchanges before the first step.
const PRIMARY_FIELDS: [FieldId; 10] = [
    FieldId::Density0,
    FieldId::Energy0,
    FieldId::Pressure,
    FieldId::Viscosity,
    FieldId::Density1,
    FieldId::Energy1,
    FieldId::XVel0,
    FieldId::YVel0,
    FieldId::XVel1,
    FieldId::YVel1,
];

impl<C: Communicator> Clover<C> {
    /// Set up this worker's chunk, writing visit snapshots to the working
    /// directory.
    pub fn new(config: Config, comm: C) -> Result<Self> {
        Self::with_output_dir(config, comm, ".")
    }

    /// Set up this worker's chunk: decompose the mesh, allocate and generate
    /// the tiles, prime the guard zones and write the initial summary.
    pub fn with_output_dir<P: Into<PathBuf>>(config: Config, comm: C, output_dir: P) -> Result<Self> {
        config.validate()?;
        config.grid.validate()?;

        let layout = decompose(config.grid.x_cells, config.grid.y_cells, comm.size())?;
        let extent = layout
            .chunks
            .get(comm.rank())
            .ok_or_else(|| Error::InvalidConfiguration(format!("no chunk for worker {}", comm.rank())))?;
        let mut chunk = Chunk::new(extent, config.tiles_per_chunk(comm.size()))?;

        debug!(
            "[{}] chunk {:?} split into {} tiles along {:?}",
            comm.rank(),
            chunk.cells,
            chunk.tiles.len(),
            chunk.split
        );
        if comm.is_boss() {
            info!(
                "Generating {} x {} chunks of a {} x {} mesh",
                layout.chunks_x, layout.chunks_y, config.grid.x_cells, config.grid.y_cells
            );
        }

        chunk.tiles.par_iter_mut().for_each(|tile| {
            initialise_chunk(&mut tile.fields, &config.grid);
            generate_chunk(&mut tile.fields, &config.states);
            ideal_gas(&mut tile.fields, false);
        });

        let mut clover = Self {
            dt: config.dtinit,
            dtold: config.dtinit,
            profiler: Profiler::new(false),
            output_dir: output_dir.into(),
            stage: Stage::Init,
            step: 0,
            time: 0.0,
            advect_x: true,
            wall_start: Instant::now(),
            first_step: Duration::ZERO,
            second_step: Duration::ZERO,
            last_summary: FieldSummary::default(),
            verdict: None,
            config,
            comm,
            chunk,
        };

        clover.update_halo(&PRIMARY_FIELDS, 2)?;

        if clover.comm.is_boss() {
            info!("Problem initialised and generated");
        }
        clover.summary()?;

        if clover.config.visit_frequency != 0 {
            clover.visit()?;
        }
        clover.profiler = Profiler::new(clover.config.profiler_on);
        clover.wall_start = Instant::now();
        Ok(clover)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// The timestep taken by the most recent step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// The most recent mesh-wide summary.
    pub fn last_summary(&self) -> FieldSummary {
        self.last_summary
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Advance the solution by one timestep. Returns `Status::Complete` once
    /// the end time or end step has been reached, after the final summary has
    /// been written.
    pub fn run_step(&mut self) -> Result<Status> {
        if self.stage == Stage::Complete {
            return Ok(Status::Complete);
        }
        self.stage = Stage::Running;

        let step_start = Instant::now();
        self.step += 1;

        self.timestep()?;
        self.pdv(true)?;
        self.accelerate();
        self.pdv(false)?;
        self.flux_calc();
        self.advection()?;
        self.reset_field();

        self.advect_x = !self.advect_x;
        self.time += self.dt;

        if self.config.summary_frequency != 0 && self.step % self.config.summary_frequency == 0 {
            self.summary()?;
        }
        if self.config.visit_frequency != 0 && self.step % self.config.visit_frequency == 0 {
            self.visit()?;
        }

        match self.step {
            1 => self.first_step = step_start.elapsed(),
            2 => self.second_step = step_start.elapsed(),
            _ => {}
        }

        if self.time + G_SMALL > self.config.end_time || self.step >= self.config.end_step {
            self.complete()?;
            return Ok(Status::Complete);
        }

        if self.comm.is_boss() {
            let wall_clock = self.wall_start.elapsed().as_secs_f64();
            let cells = self.config.grid.total_cells() as f64;
            info!("Wall clock {}", wall_clock);
            info!("Average time per cell {:e}", wall_clock / (self.step as f64 * cells));
            info!("Step time per cell    {:e}", step_start.elapsed().as_secs_f64() / cells);
        }
        Ok(Status::Continue)
    }

    /// Step until the run is complete.
    pub fn run(&mut self) -> Result<RunReport> {
        while self.run_step()? == Status::Continue {}

        Ok(RunReport {
            steps: self.step,
            time: self.time,
            summary: self.last_summary,
            verdict: self.verdict,
            wall_clock: self.wall_start.elapsed(),
        })
    }

    /// Total the conserved quantities over the whole mesh. Every worker must
    /// call this together; the boss logs the result.
    pub fn summary(&mut self) -> Result<FieldSummary> {
        let tiles = &mut self.chunk.tiles;

        self.profiler.time(Phase::IdealGas, || {
            tiles.par_iter_mut().for_each(|tile| ideal_gas(&mut tile.fields, false))
        });
        let local: FieldSummary = self
            .profiler
            .time(Phase::Summary, || tiles.par_iter().map(|tile| field_summary(&tile.fields)).sum());

        let total = all_reduce_value(&self.comm, &local, |a, b| a + b)?;

        if self.comm.is_boss() {
            info!("{}", FieldSummary::header());
            info!("{}", total.row(self.step));
        }
        self.last_summary = total;
        Ok(total)
    }

    fn complete(&mut self) -> Result<()> {
        self.stage = Stage::Complete;
        let summary = self.summary()?;

        if self.config.visit_frequency != 0 {
            self.visit()?;
        }

        self.verdict = verify(self.config.test_problem, summary.kinetic_energy);

        if self.comm.is_boss() {
            if let Some(verdict) = &self.verdict {
                verdict.log();
            }
            let wall_clock = self.wall_start.elapsed();
            info!("Calculation complete");
            info!("Clover is finishing");
            info!("Wall clock {:>11.2}", wall_clock.as_secs_f64());
            info!(
                "First step overhead {:>11.2}",
                self.first_step.as_secs_f64() - self.second_step.as_secs_f64()
            );
            if self.profiler.is_enabled() {
                self.profiler.report(wall_clock);
            }
        }
        Ok(())
    }

    fn update_halo(&mut self, fields: &[FieldId], depth: i64) -> Result<()> {
        let fields: FieldSet = fields.iter().copied().collect();
        update_halo(&mut self.chunk, &self.comm, fields, depth, &mut self.profiler)
    }

    fn timestep(&mut self) -> Result<()> {
        let tiles = &mut self.chunk.tiles;

        self.profiler.time(Phase::IdealGas, || {
            tiles.par_iter_mut().for_each(|tile| ideal_gas(&mut tile.fields, false))
        });

        self.update_halo(
            &[
                FieldId::Pressure,
                FieldId::Energy0,
                FieldId::Density0,
                FieldId::XVel0,
                FieldId::YVel0,
            ],
            1,
        )?;

        let tiles = &mut self.chunk.tiles;
        self.profiler.time(Phase::Viscosity, || {
            tiles.par_iter_mut().for_each(|tile| viscosity(&mut tile.fields))
        });

        self.update_halo(&[FieldId::Viscosity], 1)?;

        let tiles = &self.chunk.tiles;
        let config = &self.config;
        let local = self.profiler.time(Phase::Timestep, || {
            tiles
                .par_iter()
                .map(|tile| calc_dt(&tile.fields, config))
                .reduce(DtCandidate::unbounded, DtCandidate::min)
        });
        let global = all_reduce_value(&self.comm, &local, DtCandidate::min)?;

        let limits = TimestepLimits {
            dtrise: self.config.dtrise,
            dtmax: self.config.dtmax,
            dtmin: self.config.dtmin,
        };
        self.dt = limits.select(global.dt, self.dtold, self.step)?;

        if self.comm.is_boss() {
            info!(
                " Step {:>7} time {:>11.7} control {:>11} timestep {:>9.2e}{:>8}, {:>8} x {:>9.2e} y {:>9.2e}",
                self.step,
                self.time,
                global.control.label(),
                self.dt,
                global.j,
                global.k,
                global.x,
                global.y
            );
        }
        self.dtold = self.dt;
        Ok(())
    }

    fn pdv(&mut self, predict: bool) -> Result<()> {
        let tiles = &mut self.chunk.tiles;
        let dt = self.dt;

        self.profiler.time(Phase::PdV, || {
            tiles.par_iter_mut().try_for_each(|tile| pdv(&mut tile.fields, predict, dt))
        })?;

        if predict {
            self.profiler.time(Phase::IdealGas, || {
                tiles.par_iter_mut().for_each(|tile| ideal_gas(&mut tile.fields, true))
            });

            self.update_halo(&[FieldId::Pressure], 1)?;

            let tiles = &mut self.chunk.tiles;
            self.profiler.time(Phase::Revert, || {
                tiles.par_iter_mut().for_each(|tile| revert(&mut tile.fields))
            });
        }
        Ok(())
    }

    fn accelerate(&mut self) {
        let tiles = &mut self.chunk.tiles;
        let dt = self.dt;

        self.profiler.time(Phase::Acceleration, || {
            tiles.par_iter_mut().for_each(|tile| accelerate(&mut tile.fields, dt))
        });
    }

    fn flux_calc(&mut self) {
        let tiles = &mut self.chunk.tiles;
        let dt = self.dt;

        self.profiler.time(Phase::Flux, || {
            tiles.par_iter_mut().for_each(|tile| flux_calc(&mut tile.fields, dt))
        });
    }

    fn advection(&mut self) -> Result<()> {
        let cell_fields = [FieldId::Energy1, FieldId::Density1, FieldId::VolFluxX, FieldId::VolFluxY];
        let mom_fields = [
            FieldId::Density1,
            FieldId::Energy1,
            FieldId::XVel1,
            FieldId::YVel1,
            FieldId::MassFluxX,
            FieldId::MassFluxY,
        ];
        let first = if self.advect_x { Axis::I } else { Axis::J };

        self.update_halo(&cell_fields, 2)?;
        self.advec_cell(first, 1);
        self.update_halo(&mom_fields, 2)?;
        self.advec_mom(first, 1);

        self.advec_cell(first.other(), 2);
        self.update_halo(&mom_fields, 2)?;
        self.advec_mom(first.other(), 2);
        Ok(())
    }

    fn advec_cell(&mut self, dir: Axis, sweep: u32) {
        let tiles = &mut self.chunk.tiles;

        self.profiler.time(Phase::CellAdvection, || {
            tiles.par_iter_mut().for_each(|tile| advec_cell(&mut tile.fields, dir, sweep))
        });
    }

    fn advec_mom(&mut self, dir: Axis, sweep: u32) {
        let tiles = &mut self.chunk.tiles;

        self.profiler.time(Phase::MomAdvection, || {
            tiles.par_iter_mut().for_each(|tile| {
                advec_mom(&mut tile.fields, Axis::I, dir, sweep);
                advec_mom(&mut tile.fields, Axis::J, dir, sweep);
            })
        });
    }

    fn reset_field(&mut self) {
        let tiles = &mut self.chunk.tiles;

        self.profiler.time(Phase::Reset, || {
            tiles.par_iter_mut().for_each(|tile| reset_field(&mut tile.fields))
        });
    }

    fn visit(&mut self) -> Result<()> {
        let chunk = &self.chunk;
        let (step, time) = (self.step, self.time);
        let dir = &self.output_dir;

        let path = self
            .profiler
            .time(Phase::Visit, || Snapshot::from_chunk(chunk, step, time).write(dir))?;
        debug!("[{}] wrote {}", self.comm.rank(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use std::time::Duration;

    use super::{Clover, Stage, Status};
    use crate::profiler::Phase;
    use crate::visit::Snapshot;
    use crate::config::{Config, DEFAULT_DECK};
    use crate::error::Error;
    use crate::message::LocalCommunicator;

    fn single_worker() -> LocalCommunicator {
        LocalCommunicator::group(1).pop().unwrap()
    }

    #[test]
    fn initial_summary_reflects_the_generated_states() {
        let config: Config = DEFAULT_DECK.parse().unwrap();
        let mut clover = Clover::new(config, single_worker()).unwrap();
        assert_eq!(clover.stage(), Stage::Init);

        let summary = clover.summary().unwrap();
        assert!((summary.volume - 20.0).abs() < 1e-12);
        assert!((summary.mass - (0.2 * 10.0 + 1.0 * 10.0)).abs() < 1e-12);
        assert_eq!(summary.kinetic_energy, 0.0);
    }

    #[test]
    fn default_deck_finishes_within_seventy_five_steps() {
        let config: Config = DEFAULT_DECK.parse().unwrap();
        let mut clover = Clover::new(config, single_worker()).unwrap();
        let report = clover.run().unwrap();

        assert!(report.steps <= 75);
        assert!(report.time + 1e-16 > 3.0);
        assert_eq!(clover.stage(), Stage::Complete);
        assert_eq!(clover.run_step().unwrap(), Status::Complete);
        assert_eq!(clover.step(), report.steps);

        // Mass is conserved, and the gas has started moving.
        assert!((report.summary.mass - 12.0).abs() < 1e-10);
        assert!(report.summary.kinetic_energy > 0.0);
    }

    #[test]
    fn default_deck_passes_the_test_problem_check() {
        let config: Config = DEFAULT_DECK.parse().unwrap();
        let report = Clover::new(config, single_worker()).unwrap().run().unwrap();
        let verdict = report.verdict.unwrap();

        assert_eq!(report.steps, 75);
        assert_eq!(verdict.test_problem, 1);
        assert!(verdict.passed, "qa_diff = {}", verdict.qa_diff);
    }

    #[test]
    fn snapshots_are_written_at_the_visit_frequency_and_at_completion() {
        let dir = std::env::temp_dir().join(format!("clover-visits-{}", std::process::id()));
        let mut config: Config = DEFAULT_DECK.parse().unwrap();
        config.visit_frequency = 2;
        config.end_step = 5;

        Clover::with_output_dir(config, single_worker(), &dir).unwrap().run().unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["clover.0.0.cbor", "clover.2.0.cbor", "clover.4.0.cbor", "clover.5.0.cbor"]);

        let last = Snapshot::read(&dir.join("clover.5.0.cbor")).unwrap();
        assert_eq!(last.step, 5);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn summaries_follow_the_summary_frequency() {
        let mut config: Config = DEFAULT_DECK.parse().unwrap();
        config.summary_frequency = 2;
        config.end_step = 5;
        let mut clover = Clover::new(config, single_worker()).unwrap();

        clover.run_step().unwrap();
        assert_eq!(clover.last_summary().kinetic_energy, 0.0);
        clover.run_step().unwrap();
        assert!(clover.last_summary().kinetic_energy > 0.0);
        assert!((clover.last_summary().mass - 12.0).abs() < 1e-10);
    }

    #[test]
    fn profiler_records_only_when_switched_on() {
        let mut config: Config = DEFAULT_DECK.parse().unwrap();
        config.end_step = 3;

        let mut quiet = Clover::new(config.clone(), single_worker()).unwrap();
        quiet.run().unwrap();
        assert_eq!(quiet.profiler().kernel_total(), Duration::ZERO);

        config.profiler_on = true;
        config.summary_frequency = 1;
        let mut timed = Clover::new(config, single_worker()).unwrap();
        timed.run().unwrap();
        assert!(timed.profiler().is_enabled());
        assert!(timed.profiler().kernel_total() > Duration::ZERO);
        assert!(timed.profiler().total(Phase::Timestep) > Duration::ZERO);
    }

    #[test]
    fn end_step_caps_the_run() {
        let mut config: Config = DEFAULT_DECK.parse().unwrap();
        config.end_step = 5;
        let mut clover = Clover::new(config, single_worker()).unwrap();
        let report = clover.run().unwrap();
        assert_eq!(report.steps, 5);
        assert!(report.time < 3.0);
    }

    #[test]
    fn steps_respect_the_timestep_limits() {
        let mut config: Config = DEFAULT_DECK.parse().unwrap();
        config.dtinit = 0.001;
        config.end_step = 6;
        let mut clover = Clover::new(config, single_worker()).unwrap();

        let mut dtold = 0.001;
        while clover.run_step().unwrap() == Status::Continue {
            assert!(clover.dt() <= 0.04);
            assert!(clover.dt() <= dtold * 1.5 + 1e-15);
            dtold = clover.dt();
        }
        assert!((clover.dt() - 0.001 * 1.5f64.powi(6)).abs() < 1e-12);
    }

    #[test]
    fn tiled_run_matches_untiled_run() {
        let base: Config = DEFAULT_DECK.parse().unwrap();
        let mut config = base.clone();
        config.end_step = 20;
        let mut tiled = config.clone();
        tiled.tiles = crate::config::Tiles::PerChunk(2);

        let a = Clover::new(config, single_worker()).unwrap().run().unwrap();
        let b = Clover::new(tiled, single_worker()).unwrap().run().unwrap();
        assert_eq!(a.steps, b.steps);
        assert!((a.summary.kinetic_energy - b.summary.kinetic_energy).abs() < 1e-10);
        assert!((a.summary.internal_energy - b.summary.internal_energy).abs() < 1e-10);
    }

    #[test]
    fn invalid_deck_is_refused() {
        let mut config: Config = DEFAULT_DECK.parse().unwrap();
        config.dtrise = 0.0;
        assert!(matches!(
            Clover::new(config, single_worker()),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
