//! Process lifecycle subsystem.
//!
//! # Design Decisions
//! - One shutdown coordinator shared by both startup regimes
//! - Signal handling lives in the binary (Ctrl+C → trigger); the library
//!   never installs handlers itself

pub mod shutdown;

pub use shutdown::Shutdown;
