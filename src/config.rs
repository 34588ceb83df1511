//! Reads the `*clover ... *endclover` input deck.
//!
//! A deck is a list of `key value` pairs, any number per line, separated by
//! whitespace or `=`. Keys are case-insensitive and `!` starts a comment.
//! A `state n` line describes one of the initial material states and takes
//! the rest of its line.

use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::Grid;

/// The deck run when no input file is given: a 10 x 2 mesh with a dense,
/// energetic region in its left half.
pub const DEFAULT_DECK: &str = "\
*clover
 state 1 density=0.2 energy=1.0
 state 2 density=1.0 energy=2.5 geometry=rectangle xmin=0.0 xmax=5.0 ymin=0.0 ymax=2.0
 x_cells=10
 y_cells=2
 xmin=0.0
 ymin=0.0
 xmax=10.0
 ymax=2.0
 initial_timestep=0.04
 timestep_rise=1.5
 max_timestep=0.04
 end_time=3.0
 test_problem 1
*endclover
";

/// The region a state is stamped onto.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Geometry {
    Rectangle,
    Circle,
    Point,
}

/// An initial material state. State 0 is the background, filling the whole
/// mesh; each later state overwrites the cells its geometry covers.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub density: f64,
    pub energy: f64,
    pub xvel: f64,
    pub yvel: f64,
    pub geometry: Geometry,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub radius: f64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            density: 0.0,
            energy: 0.0,
            xvel: 0.0,
            yvel: 0.0,
            geometry: Geometry::Rectangle,
            xmin: 0.0,
            xmax: 0.0,
            ymin: 0.0,
            ymax: 0.0,
            radius: 0.0,
        }
    }
}

/// How many tiles each chunk is split into.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tiles {
    PerChunk(usize),
    PerProblem(usize),
}

/// The keys a deck may contain.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Key {
    InitialTimestep,
    MaxTimestep,
    TimestepRise,
    EndTime,
    EndStep,
    Xmin,
    Xmax,
    Ymin,
    Ymax,
    XCells,
    YCells,
    VisitFrequency,
    SummaryFrequency,
    TilesPerChunk,
    TilesPerProblem,
    ProfilerOn,
    TestProblem,
    State,
    KernelSelection,
}

impl FromStr for Key {
    type Err = ();

    fn from_str(word: &str) -> std::result::Result<Self, ()> {
        use Key::*;

        Ok(match word {
            "initial_timestep" => InitialTimestep,
            "max_timestep" => MaxTimestep,
            "timestep_rise" => TimestepRise,
            "end_time" => EndTime,
            "end_step" => EndStep,
            "xmin" => Xmin,
            "xmax" => Xmax,
            "ymin" => Ymin,
            "ymax" => Ymax,
            "x_cells" => XCells,
            "y_cells" => YCells,
            "visit_frequency" => VisitFrequency,
            "summary_frequency" => SummaryFrequency,
            "tiles_per_chunk" => TilesPerChunk,
            "tiles_per_problem" => TilesPerProblem,
            "profiler_on" => ProfilerOn,
            "test_problem" => TestProblem,
            "state" => State,
            "use_fortran_kernels" | "use_c_kernels" | "use_oa_kernels" => KernelSelection,
            _ => return Err(()),
        })
    }
}

/// Everything read from the input deck.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub grid: Grid,
    pub states: Vec<State>,
    pub end_time: f64,
    pub end_step: u64,
    pub dtinit: f64,
    pub dtmax: f64,
    pub dtmin: f64,
    pub dtrise: f64,
    pub dtc_safe: f64,
    pub dtu_safe: f64,
    pub dtv_safe: f64,
    pub dtdiv_safe: f64,
    pub visit_frequency: u64,
    pub summary_frequency: u64,
    pub tiles: Tiles,
    pub profiler_on: bool,
    pub test_problem: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: Grid {
                xmin: 0.0,
                xmax: 100.0,
                ymin: 0.0,
                ymax: 100.0,
                x_cells: 10,
                y_cells: 10,
            },
            states: Vec::new(),
            end_time: 10.0,
            end_step: 640000,
            dtinit: 0.1,
            dtmax: 1.0,
            dtmin: 1e-7,
            dtrise: 1.5,
            dtc_safe: 0.7,
            dtu_safe: 0.5,
            dtv_safe: 0.5,
            dtdiv_safe: 0.7,
            visit_frequency: 0,
            summary_frequency: 0,
            tiles: Tiles::PerChunk(1),
            profiler_on: false,
            test_problem: 0,
        }
    }
}

/// Walks the tokens of one line, keeping track of the line number for error
/// messages.
struct Words<'a> {
    line: usize,
    words: std::vec::IntoIter<&'a str>,
}

impl<'a> Words<'a> {
    fn next_word(&mut self) -> Option<&'a str> {
        self.words.next()
    }

    fn value<T: FromStr>(&mut self, key: &str) -> Result<T> {
        let line = self.line;
        let word = self.words.next().ok_or_else(|| Error::MissingValue { line, key: key.into() })?;
        word.parse().map_err(|_| Error::InvalidValue {
            line,
            key: key.into(),
            value: word.into(),
        })
    }
}

impl Config {
    /// Read a deck from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Parse the text of a deck. Lines outside the `*clover` section are
    /// ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Config::default();
        let mut states: Vec<Option<State>> = Vec::new();
        let mut in_section = false;
        let mut found_section = false;
        let max_states = text.lines().count();

        for (n, raw) in text.lines().enumerate() {
            let line = raw.split('!').next().unwrap_or("").to_lowercase();
            let trimmed = line.trim();

            if trimmed.starts_with("*clover") {
                in_section = true;
                found_section = true;
                continue;
            }
            if trimmed.starts_with("*endclover") {
                in_section = false;
                continue;
            }
            if !in_section {
                continue;
            }
            let words: Vec<&str> = line.split(|c: char| c == '=' || c.is_whitespace()).filter(|w| !w.is_empty()).collect();
            let mut words = Words {
                line: n + 1,
                words: words.into_iter(),
            };
            config.read_line(&mut words, &mut states, max_states)?;
        }

        if !found_section {
            return Err(Error::InvalidConfiguration("no *clover section in the input deck".into()));
        }
        config.grid.validate()?;
        config.states = collect_states(states)?;
        config.nudge_state_bounds();
        config.validate()?;
        Ok(config)
    }

    fn read_line(&mut self, words: &mut Words, states: &mut Vec<Option<State>>, max_states: usize) -> Result<()> {
        while let Some(word) = words.next_word() {
            let key = match word.parse::<Key>() {
                Ok(key) => key,
                Err(()) => {
                    warn!("line {}: ignoring unrecognised key '{}'", words.line, word);
                    continue;
                }
            };
            match key {
                Key::InitialTimestep => self.dtinit = words.value(word)?,
                Key::MaxTimestep => self.dtmax = words.value(word)?,
                Key::TimestepRise => self.dtrise = words.value(word)?,
                Key::EndTime => self.end_time = words.value(word)?,
                Key::EndStep => self.end_step = words.value(word)?,
                Key::Xmin => self.grid.xmin = words.value(word)?,
                Key::Xmax => self.grid.xmax = words.value(word)?,
                Key::Ymin => self.grid.ymin = words.value(word)?,
                Key::Ymax => self.grid.ymax = words.value(word)?,
                Key::XCells => self.grid.x_cells = words.value(word)?,
                Key::YCells => self.grid.y_cells = words.value(word)?,
                Key::VisitFrequency => self.visit_frequency = words.value(word)?,
                Key::SummaryFrequency => self.summary_frequency = words.value(word)?,
                Key::TilesPerChunk => self.tiles = Tiles::PerChunk(words.value(word)?),
                Key::TilesPerProblem => self.tiles = Tiles::PerProblem(words.value(word)?),
                Key::ProfilerOn => self.profiler_on = true,
                Key::TestProblem => self.test_problem = words.value(word)?,
                Key::KernelSelection => info!("kernel selection '{}' has no effect", word),
                Key::State => return read_state(words, states, max_states),
            }
        }
        Ok(())
    }

    /// If a state boundary falls exactly on a cell boundary, round-off can put
    /// the state one cell further than intended. States after the first two
    /// have their rectangle pulled inward by a hundredth of a cell.
    fn nudge_state_bounds(&mut self) {
        let (dx, dy) = self.grid.cell_spacing();

        for state in self.states.iter_mut().skip(2) {
            state.xmin += dx / 100.0;
            state.ymin += dy / 100.0;
            state.xmax -= dx / 100.0;
            state.ymax -= dy / 100.0;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("initial_timestep", self.dtinit),
            ("max_timestep", self.dtmax),
            ("timestep_rise", self.dtrise),
        ];
        for (key, value) in positive {
            if !(value > 0.0) {
                return Err(Error::InvalidConfiguration(format!("{} must be positive, got {}", key, value)));
            }
        }
        Ok(())
    }

    /// Resolve the number of tiles per chunk for a run on `workers` workers.
    pub fn tiles_per_chunk(&self, workers: usize) -> usize {
        match self.tiles {
            Tiles::PerChunk(n) => n,
            Tiles::PerProblem(n) => n / workers.max(1),
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

/// Read one state definition. Each state takes a line of its own, so a state
/// number larger than the deck's line count can never be filled in.
fn read_state(words: &mut Words, states: &mut Vec<Option<State>>, max_states: usize) -> Result<()> {
    let number: usize = words.value("state")?;

    if number == 0 || number > max_states {
        return Err(Error::InvalidValue {
            line: words.line,
            key: "state".into(),
            value: number.to_string(),
        });
    }
    if states.len() < number {
        states.resize(number, None)
    }
    if states[number - 1].is_some() {
        return Err(Error::DuplicateState(number));
    }
    let mut state = State::default();

    while let Some(word) = words.next_word() {
        match word {
            "xvel" => state.xvel = words.value(word)?,
            "yvel" => state.yvel = words.value(word)?,
            "xmin" => state.xmin = words.value(word)?,
            "xmax" => state.xmax = words.value(word)?,
            "ymin" => state.ymin = words.value(word)?,
            "ymax" => state.ymax = words.value(word)?,
            "radius" => state.radius = words.value(word)?,
            "density" => state.density = words.value(word)?,
            "energy" => state.energy = words.value(word)?,
            "geometry" => {
                let line = words.line;
                let name: String = words.value(word)?;
                state.geometry = match name.as_str() {
                    "rectangle" => Geometry::Rectangle,
                    "circle" => Geometry::Circle,
                    "point" => Geometry::Point,
                    _ => return Err(Error::UnknownGeometry { line, name }),
                }
            }
            _ => warn!("line {}: ignoring unrecognised state key '{}'", words.line, word),
        }
    }
    states[number - 1] = Some(state);
    Ok(())
}

fn collect_states(states: Vec<Option<State>>) -> Result<Vec<State>> {
    if states.is_empty() {
        return Err(Error::NoStates);
    }
    states
        .into_iter()
        .enumerate()
        .map(|(n, state)| state.ok_or(Error::UndefinedState(n + 1)))
        .collect()
}
