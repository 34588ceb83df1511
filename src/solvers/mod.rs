//! Drivers that run the hydro cycle over a decomposed mesh.

pub mod clover;
pub mod timestep;
pub mod workers;

pub use clover::{Clover, RunReport, Stage, Status};
pub use workers::run_workers;
