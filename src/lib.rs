//! Cloverleaf is an explicit, compressible Lagrangian-Eulerian hydrodynamics
//! solver on a structured 2D mesh. The mesh is split into rectangular chunks,
//! one per worker, and each chunk into tiles the kernels run over in
//! parallel. Fields are stored with two guard zones around every tile and
//! addressed by global, signed indexes; the guard zones are refreshed by a
//! halo exchange that copies between tiles, passes strips between workers,
//! and reflects at the edges of the mesh.

pub mod chunk;
pub mod config;
pub mod decompose;
pub mod error;
pub mod field;
pub mod grid;
pub mod halo;
pub mod hydro;
pub mod index_space;
pub mod message;
pub mod patch;
pub mod profiler;
pub mod solvers;
pub mod summary;
pub mod tile;
pub mod visit;
