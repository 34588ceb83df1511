use thiserror::Error;

/// Error to represent an invalid input deck, a failed exchange between
/// workers, or a hydrodynamic state the solver cannot advance from. None of
/// these are recovered from: they end the run.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no states defined")]
    NoStates,

    #[error("state {0} defined twice")]
    DuplicateState(usize),

    #[error("state {0} is referenced but never defined")]
    UndefinedState(usize),

    #[error("line {line}: missing value for '{key}'")]
    MissingValue { line: usize, key: String },

    #[error("line {line}: invalid value '{value}' for '{key}'")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: unknown geometry '{name}'")]
    UnknownGeometry { line: usize, name: String },

    #[error("small timestep {dt:e} (minimum {dtmin:e}) at step {step}")]
    SmallTimestep { step: u64, dt: f64, dtmin: f64 },

    #[error("negative cell volume {volume:e} at ({j}, {k})")]
    NegativeVolume { volume: f64, j: i64, k: i64 },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("failed to write snapshot: {0}")]
    Snapshot(String),

    #[error("transport: {0}")]
    Transport(String),

    #[error("worker {0} aborted the run")]
    PeerAborted(usize),
}

impl Error {
    /// Whether this error was raised while reading or validating the input
    /// deck, as opposed to while the run was advancing.
    pub fn is_configuration(&self) -> bool {
        use Error::*;

        matches!(
            self,
            InvalidConfiguration(_)
                | NoStates
                | DuplicateState(_)
                | UndefinedState(_)
                | MissingValue { .. }
                | InvalidValue { .. }
                | UnknownGeometry { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
