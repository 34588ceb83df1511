use std::time::{Duration, Instant};

use log::info;

/// The phases of a step that the profiler keeps separate totals for.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Timestep,
    IdealGas,
    Viscosity,
    PdV,
    Acceleration,
    Revert,
    Flux,
    CellAdvection,
    MomAdvection,
    Reset,
    Summary,
    Visit,
    TileHaloExchange,
    SelfHaloExchange,
    MpiHaloExchange,
}

impl Phase {
    pub const ALL: [Phase; 15] = [
        Phase::Timestep,
        Phase::IdealGas,
        Phase::Viscosity,
        Phase::PdV,
        Phase::Acceleration,
        Phase::Revert,
        Phase::Flux,
        Phase::CellAdvection,
        Phase::MomAdvection,
        Phase::Reset,
        Phase::Summary,
        Phase::Visit,
        Phase::TileHaloExchange,
        Phase::SelfHaloExchange,
        Phase::MpiHaloExchange,
    ];

    pub fn label(self) -> &'static str {
        use Phase::*;

        match self {
            Timestep => "Timestep",
            IdealGas => "Ideal Gas",
            Viscosity => "Viscosity",
            PdV => "PdV",
            Acceleration => "Acceleration",
            Revert => "Revert",
            Flux => "Fluxes",
            CellAdvection => "Cell Advection",
            MomAdvection => "Momentum Advection",
            Reset => "Reset",
            Summary => "Summary",
            Visit => "Visit",
            TileHaloExchange => "Tile Halo Exchange",
            SelfHaloExchange => "Self Halo Exchange",
            MpiHaloExchange => "MPI Halo Exchange",
        }
    }
}

/// Accumulates wall-clock time per phase. When disabled, `time` just runs
/// the closure.
///
#[derive(Clone, Debug, Default)]
pub struct Profiler {
    enabled: bool,
    totals: [Duration; 15],
}

impl Profiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            totals: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run a closure, charging its duration to the given phase.
    pub fn time<R, F: FnOnce() -> R>(&mut self, phase: Phase, f: F) -> R {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let result = f();
        self.add(phase, start.elapsed());
        result
    }

    pub fn add(&mut self, phase: Phase, elapsed: Duration) {
        if self.enabled {
            self.totals[phase as usize] += elapsed
        }
    }

    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase as usize]
    }

    pub fn kernel_total(&self) -> Duration {
        self.totals.iter().sum()
    }

    /// Log every phase's total and its share of the wall clock.
    pub fn report(&self, wall_clock: Duration) {
        let wall = wall_clock.as_secs_f64().max(f64::MIN_POSITIVE);

        info!("{:<24} {:>14} {:>12}", "Profiler Output", "Time", "Percentage");
        for phase in Phase::ALL {
            let t = self.total(phase).as_secs_f64();
            info!("{:<24} {:>14.4} {:>12.4}", phase.label(), t, 100.0 * t / wall);
        }
        let t = self.kernel_total().as_secs_f64();
        info!("{:<24} {:>14.4} {:>12.4}", "The Rest", wall - t, 100.0 * (wall - t) / wall);
    }
}

#[cfg(test)]
mod test {

    use super::{Phase, Profiler};
    use std::time::Duration;

    #[test]
    fn disabled_profiler_records_nothing() {
        let mut profiler = Profiler::new(false);
        let x = profiler.time(Phase::PdV, || 3);
        profiler.add(Phase::Flux, Duration::from_millis(5));
        assert_eq!(x, 3);
        assert_eq!(profiler.kernel_total(), Duration::ZERO);
    }

    #[test]
    fn enabled_profiler_accumulates_per_phase() {
        let mut profiler = Profiler::new(true);
        profiler.add(Phase::Flux, Duration::from_millis(5));
        profiler.add(Phase::Flux, Duration::from_millis(2));
        profiler.add(Phase::Visit, Duration::from_millis(1));
        assert_eq!(profiler.total(Phase::Flux), Duration::from_millis(7));
        assert_eq!(profiler.kernel_total(), Duration::from_millis(8));
    }
}
