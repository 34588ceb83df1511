//! This module exports a minimal message-passing API, which is encapsulated
//! by a `Communicator` trait. Implementors only need to write `send`, `recv`
//! and `increment` operations for a given transport layer (an in-process
//! transport over crossbeam channels is included). The trait then provides
//! default implementations for broadcast, reduce, and reduce-all operations.
//!

pub mod comm;
pub mod local;
pub mod util;

pub use comm::Communicator;
pub use local::LocalCommunicator;
