//! Cluster supervision subsystem.
//!
//! # Data Flow
//! ```text
//! master process
//!     → launcher.rs (re-exec binary with --worker, stdout piped)
//!     → monitor task per worker (pipe messages + exit status)
//!     → supervisor.rs (single event loop, restart policy)
//!
//! worker process
//!     → worker.rs (report online/listening over the stdout pipe)
//! ```
//!
//! # Design Decisions
//! - Master and workers are independent OS processes; the only link is
//!   the stdout pipe and the exit status
//! - Unexpected exits always respawn; shutdown-era exits are terminal
//! - Worker ids are never reused within one master lifetime

pub mod launcher;
pub mod supervisor;
pub mod worker;

pub use launcher::WorkerLauncher;
pub use supervisor::{LifecycleEvent, Supervisor};
pub use worker::{WorkerExit, WorkerHandle, WorkerMessage, WorkerState};
